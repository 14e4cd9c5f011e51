// Integration tests for the booking flows
//
// These tests verify:
// 1. The venue lifecycle: list, edit, delete with show cascade
// 2. Search behavior over seeded names
// 3. Past/upcoming aggregation across both participants of a show

mod helpers;

use chrono::Utc;
use helpers::{ArtistBuilder, ShowBuilder, TestDb, VenueBuilder};
use showbill::errors::ShowbillError;
use showbill::storage;

#[tokio::test]
async fn test_venue_lifecycle_with_cascade() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let venue = VenueBuilder::new("The Musical Hop")
        .in_area("San Francisco", "CA")
        .with_genres(&["Jazz", "Folk"])
        .seeking_talent("We are on the lookout for a local artist.")
        .create(db)
        .await;
    let artist = ArtistBuilder::new("Guns N Petals")
        .with_image_link("https://example.com/gnp.jpg")
        .create(db)
        .await;

    let show = ShowBuilder::new(artist.id, venue.id)
        .starting_at(Utc::now().timestamp() + 7200)
        .create(db)
        .await;

    // edit is a full-record overwrite
    let updated = storage::update_venue(
        db,
        venue.id,
        storage::NewVenue {
            name: "The Musical Hop".to_string(),
            city: Some("Oakland".to_string()),
            state: Some("CA".to_string()),
            genres: vec!["Jazz".to_string()],
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update venue");
    assert_eq!(updated.city, Some("Oakland".to_string()));
    assert!(!updated.seeking_talent);
    assert_eq!(updated.seeking_description, None);

    // deleting the venue removes its shows but not the artist
    storage::delete_venue(db, venue.id)
        .await
        .expect("Failed to delete venue");

    assert!(storage::get_show(db, show.id)
        .await
        .expect("Query failed")
        .is_none());
    assert!(storage::get_artist(db, artist.id)
        .await
        .expect("Query failed")
        .is_some());
}

#[tokio::test]
async fn test_artist_search_over_seeded_names() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    for name in ["Guns N Petals", "Matt Quevado", "The Wild Sax Band"] {
        ArtistBuilder::new(name).create(db).await;
    }

    let results = storage::search_artists(db, "A").await.expect("Search failed");
    assert_eq!(results.count, 3);

    let results = storage::search_artists(db, "band")
        .await
        .expect("Search failed");
    assert_eq!(results.count, 1);
    assert_eq!(results.data[0].name, "The Wild Sax Band");

    let results = storage::search_artists(db, "quevado")
        .await
        .expect("Search failed");
    assert_eq!(results.count, 1);
    assert_eq!(results.data[0].name, "Matt Quevado");
}

#[tokio::test]
async fn test_aggregation_covers_both_participants() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let venue = VenueBuilder::new("Park Square Live Music & Coffee")
        .in_area("San Francisco", "CA")
        .create(db)
        .await;
    let artist = ArtistBuilder::new("The Wild Sax Band").create(db).await;

    let as_of = Utc::now().timestamp();
    ShowBuilder::new(artist.id, venue.id)
        .starting_at(as_of - 3600)
        .create(db)
        .await;
    ShowBuilder::new(artist.id, venue.id)
        .starting_at(as_of + 3600)
        .create(db)
        .await;

    // the same show set is visible from the venue and the artist side
    assert_eq!(
        storage::past_shows_count_for_venue(db, venue.id, as_of)
            .await
            .expect("count"),
        1
    );
    assert_eq!(
        storage::upcoming_shows_count_for_venue(db, venue.id, as_of)
            .await
            .expect("count"),
        1
    );
    assert_eq!(
        storage::past_shows_count_for_artist(db, artist.id, as_of)
            .await
            .expect("count"),
        1
    );
    assert_eq!(
        storage::upcoming_shows_count_for_artist(db, artist.id, as_of)
            .await
            .expect("count"),
        1
    );

    let upcoming = storage::upcoming_shows_for_artist(db, artist.id, as_of)
        .await
        .expect("upcoming query");
    let context = storage::show_context(db, &upcoming[0])
        .await
        .expect("context");
    assert_eq!(context.venue_name, "Park Square Live Music & Coffee");
    assert_eq!(context.artist_name, "The Wild Sax Band");
}

#[tokio::test]
async fn test_area_grouping_over_builders() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    VenueBuilder::new("Paradise Rock Club")
        .in_area("Boston", "MA")
        .create(db)
        .await;
    VenueBuilder::new("The Sinclair")
        .in_area("Boston", "MA")
        .create(db)
        .await;
    VenueBuilder::new("Bowery Ballroom")
        .in_area("NYC", "NY")
        .create(db)
        .await;

    let areas = storage::venues_by_area(db).await.expect("grouping failed");
    assert_eq!(areas.len(), 2);

    let mut sizes: Vec<usize> = areas.iter().map(|a| a.venues.len()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![1, 2]);
}

#[tokio::test]
async fn test_update_unknown_artist_leaves_prior_state() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let artist = ArtistBuilder::new("Matt Quevado")
        .in_area("San Francisco", "CA")
        .create(db)
        .await;

    let result = storage::update_artist(
        db,
        artist.id + 100,
        storage::NewArtist {
            name: "Someone Else".to_string(),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ShowbillError::NotFound(_))));

    let unchanged = storage::get_artist(db, artist.id)
        .await
        .expect("Query failed")
        .expect("Artist not found");
    assert_eq!(unchanged.name, "Matt Quevado");
    assert_eq!(unchanged.city, Some("San Francisco".to_string()));
}
