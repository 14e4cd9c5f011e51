use sea_orm::DatabaseConnection;
use showbill::entities;
use showbill::storage;

/// Builder for creating test venues
pub struct VenueBuilder {
    input: storage::NewVenue,
}

impl VenueBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            input: storage::NewVenue {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn in_area(mut self, city: &str, state: &str) -> Self {
        self.input.city = Some(city.to_string());
        self.input.state = Some(state.to_string());
        self
    }

    pub fn with_genres(mut self, genres: &[&str]) -> Self {
        self.input.genres = genres.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_image_link(mut self, image_link: &str) -> Self {
        self.input.image_link = Some(image_link.to_string());
        self
    }

    pub fn seeking_talent(mut self, description: &str) -> Self {
        self.input.seeking_talent = true;
        self.input.seeking_description = Some(description.to_string());
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> storage::Venue {
        storage::create_venue(db, self.input)
            .await
            .expect("Failed to create test venue")
    }
}

/// Builder for creating test artists
pub struct ArtistBuilder {
    input: storage::NewArtist,
}

impl ArtistBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            input: storage::NewArtist {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn in_area(mut self, city: &str, state: &str) -> Self {
        self.input.city = Some(city.to_string());
        self.input.state = Some(state.to_string());
        self
    }

    pub fn with_genres(mut self, genres: &[&str]) -> Self {
        self.input.genres = genres.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_image_link(mut self, image_link: &str) -> Self {
        self.input.image_link = Some(image_link.to_string());
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> storage::Artist {
        storage::create_artist(db, self.input)
            .await
            .expect("Failed to create test artist")
    }
}

/// Builder for creating test shows
pub struct ShowBuilder {
    artist_id: i32,
    venue_id: i32,
    start_time: Option<i64>,
}

impl ShowBuilder {
    pub fn new(artist_id: i32, venue_id: i32) -> Self {
        Self {
            artist_id,
            venue_id,
            start_time: None,
        }
    }

    pub fn starting_at(mut self, start_time: i64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> entities::show::Model {
        storage::create_show(
            db,
            storage::NewShow {
                artist_id: self.artist_id,
                venue_id: self.venue_id,
                start_time: self.start_time,
            },
        )
        .await
        .expect("Failed to create test show")
    }
}
