use crate::entities::{artist, show, venue};
use crate::errors::ShowbillError;
use crate::settings::Database as DbCfg;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub id: i32,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: i32,
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVenue {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShow {
    pub artist_id: i32,
    pub venue_id: i32,
    /// Unix timestamp; defaults to "now" when the form leaves it unset
    pub start_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults<T> {
    pub count: usize,
    pub data: Vec<T>,
}

/// Name and image of the artist and venue a show references
#[derive(Debug, Clone, Serialize)]
pub struct ShowContext {
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
}

/// Venues sharing one (city, state) pair
#[derive(Debug, Clone, Serialize)]
pub struct Area {
    pub city: Option<String>,
    pub state: Option<String>,
    pub venues: Vec<Venue>,
}

impl NewVenue {
    fn validate(&self) -> Result<(), ShowbillError> {
        if self.name.trim().is_empty() {
            return Err(ShowbillError::Validation("venue name is required".into()));
        }
        Ok(())
    }
}

impl NewArtist {
    fn validate(&self) -> Result<(), ShowbillError> {
        if self.name.trim().is_empty() {
            return Err(ShowbillError::Validation("artist name is required".into()));
        }
        Ok(())
    }
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, ShowbillError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

fn venue_from_model(model: venue::Model) -> Result<Venue, ShowbillError> {
    let genres: Vec<String> = serde_json::from_str(&model.genres)?;
    Ok(Venue {
        id: model.id,
        name: model.name,
        city: model.city,
        state: model.state,
        address: model.address,
        phone: model.phone,
        image_link: model.image_link,
        facebook_link: model.facebook_link,
        website: model.website,
        genres,
        seeking_talent: model.seeking_talent != 0,
        seeking_description: model.seeking_description,
    })
}

fn artist_from_model(model: artist::Model) -> Result<Artist, ShowbillError> {
    let genres: Vec<String> = serde_json::from_str(&model.genres)?;
    Ok(Artist {
        id: model.id,
        name: model.name,
        city: model.city,
        state: model.state,
        phone: model.phone,
        image_link: model.image_link,
        facebook_link: model.facebook_link,
        website: model.website,
        genres,
        seeking_venue: model.seeking_venue != 0,
        seeking_description: model.seeking_description,
    })
}

// Venue management functions

pub async fn create_venue<C>(db: &C, input: NewVenue) -> Result<Venue, ShowbillError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let genres_json = serde_json::to_string(&input.genres)?;

    let model = venue::ActiveModel {
        id: Default::default(),
        name: Set(input.name.trim().to_string()),
        city: Set(input.city),
        state: Set(input.state),
        address: Set(input.address),
        phone: Set(input.phone),
        image_link: Set(input.image_link),
        facebook_link: Set(input.facebook_link),
        website: Set(input.website),
        genres: Set(genres_json),
        seeking_talent: Set(if input.seeking_talent { 1 } else { 0 }),
        seeking_description: Set(input.seeking_description),
    };

    let inserted = model.insert(db).await?;
    venue_from_model(inserted)
}

pub async fn get_venue<C>(db: &C, id: i32) -> Result<Option<Venue>, ShowbillError>
where
    C: ConnectionTrait,
{
    if let Some(model) = venue::Entity::find_by_id(id).one(db).await? {
        Ok(Some(venue_from_model(model)?))
    } else {
        Ok(None)
    }
}

/// All venues in unspecified order; callers must not depend on ordering.
pub async fn list_venues<C>(db: &C) -> Result<Vec<Venue>, ShowbillError>
where
    C: ConnectionTrait,
{
    venue::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(venue_from_model)
        .collect()
}

/// Overwrites every mutable field of the venue in one statement.
pub async fn update_venue<C>(db: &C, id: i32, input: NewVenue) -> Result<Venue, ShowbillError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let existing = venue::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("venue {id}")))?;

    let genres_json = serde_json::to_string(&input.genres)?;

    let mut active: venue::ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.city = Set(input.city);
    active.state = Set(input.state);
    active.address = Set(input.address);
    active.phone = Set(input.phone);
    active.image_link = Set(input.image_link);
    active.facebook_link = Set(input.facebook_link);
    active.website = Set(input.website);
    active.genres = Set(genres_json);
    active.seeking_talent = Set(if input.seeking_talent { 1 } else { 0 });
    active.seeking_description = Set(input.seeking_description);

    let updated = active.update(db).await?;
    venue_from_model(updated)
}

/// Removes the venue; its shows go with it via the foreign-key cascade.
pub async fn delete_venue<C>(db: &C, id: i32) -> Result<(), ShowbillError>
where
    C: ConnectionTrait,
{
    let result = venue::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(ShowbillError::NotFound(format!("venue {id}")));
    }
    Ok(())
}

/// Case-insensitive substring match anywhere in the venue name.
pub async fn search_venues<C>(db: &C, term: &str) -> Result<SearchResults<Venue>, ShowbillError>
where
    C: ConnectionTrait,
{
    let pattern = format!("%{}%", term.to_lowercase());
    let models = venue::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(venue::Column::Name))).like(pattern))
        .all(db)
        .await?;

    let data: Vec<Venue> = models
        .into_iter()
        .map(venue_from_model)
        .collect::<Result<_, _>>()?;
    Ok(SearchResults {
        count: data.len(),
        data,
    })
}

pub async fn recent_venues<C>(db: &C, limit: u64) -> Result<Vec<Venue>, ShowbillError>
where
    C: ConnectionTrait,
{
    venue::Entity::find()
        .order_by_desc(venue::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(venue_from_model)
        .collect()
}

pub async fn count_venues<C>(db: &C) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(venue::Entity::find().count(db).await?)
}

// Artist management functions

pub async fn create_artist<C>(db: &C, input: NewArtist) -> Result<Artist, ShowbillError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let genres_json = serde_json::to_string(&input.genres)?;

    let model = artist::ActiveModel {
        id: Default::default(),
        name: Set(input.name.trim().to_string()),
        city: Set(input.city),
        state: Set(input.state),
        phone: Set(input.phone),
        image_link: Set(input.image_link),
        facebook_link: Set(input.facebook_link),
        website: Set(input.website),
        genres: Set(genres_json),
        seeking_venue: Set(if input.seeking_venue { 1 } else { 0 }),
        seeking_description: Set(input.seeking_description),
    };

    let inserted = model.insert(db).await?;
    artist_from_model(inserted)
}

pub async fn get_artist<C>(db: &C, id: i32) -> Result<Option<Artist>, ShowbillError>
where
    C: ConnectionTrait,
{
    if let Some(model) = artist::Entity::find_by_id(id).one(db).await? {
        Ok(Some(artist_from_model(model)?))
    } else {
        Ok(None)
    }
}

/// All artists in unspecified order; callers must not depend on ordering.
pub async fn list_artists<C>(db: &C) -> Result<Vec<Artist>, ShowbillError>
where
    C: ConnectionTrait,
{
    artist::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(artist_from_model)
        .collect()
}

/// Overwrites every mutable field of the artist in one statement.
pub async fn update_artist<C>(db: &C, id: i32, input: NewArtist) -> Result<Artist, ShowbillError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let existing = artist::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("artist {id}")))?;

    let genres_json = serde_json::to_string(&input.genres)?;

    let mut active: artist::ActiveModel = existing.into();
    active.name = Set(input.name.trim().to_string());
    active.city = Set(input.city);
    active.state = Set(input.state);
    active.phone = Set(input.phone);
    active.image_link = Set(input.image_link);
    active.facebook_link = Set(input.facebook_link);
    active.website = Set(input.website);
    active.genres = Set(genres_json);
    active.seeking_venue = Set(if input.seeking_venue { 1 } else { 0 });
    active.seeking_description = Set(input.seeking_description);

    let updated = active.update(db).await?;
    artist_from_model(updated)
}

pub async fn delete_artist<C>(db: &C, id: i32) -> Result<(), ShowbillError>
where
    C: ConnectionTrait,
{
    let result = artist::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(ShowbillError::NotFound(format!("artist {id}")));
    }
    Ok(())
}

/// Case-insensitive substring match anywhere in the artist name.
pub async fn search_artists<C>(db: &C, term: &str) -> Result<SearchResults<Artist>, ShowbillError>
where
    C: ConnectionTrait,
{
    let pattern = format!("%{}%", term.to_lowercase());
    let models = artist::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(artist::Column::Name))).like(pattern))
        .all(db)
        .await?;

    let data: Vec<Artist> = models
        .into_iter()
        .map(artist_from_model)
        .collect::<Result<_, _>>()?;
    Ok(SearchResults {
        count: data.len(),
        data,
    })
}

pub async fn recent_artists<C>(db: &C, limit: u64) -> Result<Vec<Artist>, ShowbillError>
where
    C: ConnectionTrait,
{
    artist::Entity::find()
        .order_by_desc(artist::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(artist_from_model)
        .collect()
}

pub async fn count_artists<C>(db: &C) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(artist::Entity::find().count(db).await?)
}

// Show management functions

/// Inserts a show. The referenced artist and venue must already exist; the
/// foreign keys back this up, but the pre-check yields a usable message.
pub async fn create_show<C>(db: &C, input: NewShow) -> Result<show::Model, ShowbillError>
where
    C: ConnectionTrait,
{
    if artist::Entity::find_by_id(input.artist_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(ShowbillError::NotFound(format!(
            "artist {}",
            input.artist_id
        )));
    }
    if venue::Entity::find_by_id(input.venue_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(ShowbillError::NotFound(format!("venue {}", input.venue_id)));
    }

    let start_time = input
        .start_time
        .unwrap_or_else(|| Utc::now().timestamp());

    let model = show::ActiveModel {
        id: Default::default(),
        artist_id: Set(input.artist_id),
        venue_id: Set(input.venue_id),
        start_time: Set(start_time),
    };

    Ok(model.insert(db).await?)
}

pub async fn get_show<C>(db: &C, id: i32) -> Result<Option<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find_by_id(id).one(db).await?)
}

/// All shows in unspecified order; callers must not depend on ordering.
pub async fn list_shows<C>(db: &C) -> Result<Vec<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find().all(db).await?)
}

// Show aggregation
//
// Past/upcoming classification is computed per call against the explicit
// `as_of` timestamp. The comparisons are strict on both sides: a show
// starting exactly at `as_of` is in neither bucket.

pub async fn past_shows_for_venue<C>(
    db: &C,
    venue_id: i32,
    as_of: i64,
) -> Result<Vec<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .filter(show::Column::StartTime.lt(as_of))
        .all(db)
        .await?)
}

pub async fn upcoming_shows_for_venue<C>(
    db: &C,
    venue_id: i32,
    as_of: i64,
) -> Result<Vec<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .filter(show::Column::StartTime.gt(as_of))
        .all(db)
        .await?)
}

pub async fn past_shows_count_for_venue<C>(
    db: &C,
    venue_id: i32,
    as_of: i64,
) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .filter(show::Column::StartTime.lt(as_of))
        .count(db)
        .await?)
}

pub async fn upcoming_shows_count_for_venue<C>(
    db: &C,
    venue_id: i32,
    as_of: i64,
) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::VenueId.eq(venue_id))
        .filter(show::Column::StartTime.gt(as_of))
        .count(db)
        .await?)
}

pub async fn past_shows_for_artist<C>(
    db: &C,
    artist_id: i32,
    as_of: i64,
) -> Result<Vec<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .filter(show::Column::StartTime.lt(as_of))
        .all(db)
        .await?)
}

pub async fn upcoming_shows_for_artist<C>(
    db: &C,
    artist_id: i32,
    as_of: i64,
) -> Result<Vec<show::Model>, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .filter(show::Column::StartTime.gt(as_of))
        .all(db)
        .await?)
}

pub async fn past_shows_count_for_artist<C>(
    db: &C,
    artist_id: i32,
    as_of: i64,
) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .filter(show::Column::StartTime.lt(as_of))
        .count(db)
        .await?)
}

pub async fn upcoming_shows_count_for_artist<C>(
    db: &C,
    artist_id: i32,
    as_of: i64,
) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find()
        .filter(show::Column::ArtistId.eq(artist_id))
        .filter(show::Column::StartTime.gt(as_of))
        .count(db)
        .await?)
}

pub async fn count_shows<C>(db: &C) -> Result<u64, ShowbillError>
where
    C: ConnectionTrait,
{
    Ok(show::Entity::find().count(db).await?)
}

/// Single-row lookups of the artist and venue a show references. A dangling
/// reference cannot occur while the delete cascade holds, so it is an error.
pub async fn show_context<C>(db: &C, s: &show::Model) -> Result<ShowContext, ShowbillError>
where
    C: ConnectionTrait,
{
    let artist = artist::Entity::find_by_id(s.artist_id)
        .one(db)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("artist {}", s.artist_id)))?;
    let venue = venue::Entity::find_by_id(s.venue_id)
        .one(db)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("venue {}", s.venue_id)))?;

    Ok(ShowContext {
        artist_name: artist.name,
        artist_image_link: artist.image_link,
        venue_name: venue.name,
        venue_image_link: venue.image_link,
    })
}

// Area grouping

/// Partitions all venues by the distinct (city, state) pairs present.
/// No ordering guarantee among groups or within a group.
pub async fn venues_by_area<C>(db: &C) -> Result<Vec<Area>, ShowbillError>
where
    C: ConnectionTrait,
{
    let mut groups: HashMap<(Option<String>, Option<String>), Vec<Venue>> = HashMap::new();

    for model in venue::Entity::find().all(db).await? {
        let v = venue_from_model(model)?;
        groups
            .entry((v.city.clone(), v.state.clone()))
            .or_default()
            .push(v);
    }

    Ok(groups
        .into_iter()
        .map(|((city, state), venues)| Area {
            city,
            state,
            venues,
        })
        .collect())
}
