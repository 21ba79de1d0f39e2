//! Integration tests against an in-memory catalog.

use core_catalog::db::connect_in_memory;
use core_catalog::{
    AlbumRepository, ArtistRepository, CatalogError, NewTrack, SqliteAlbumRepository,
    SqliteArtistRepository, SqliteTrackRepository, TrackRepository,
};

fn new_track(source_id: &str) -> NewTrack {
    NewTrack {
        title: "One More Time".to_string(),
        artist_id: None,
        album_id: None,
        duration_seconds: 213,
        genre: Some("Music".to_string()),
        thumbnail_url: None,
        audio_url: None,
        audio_object_key: None,
        audio_sha256: None,
        source_type: "youtube".to_string(),
        source_id: source_id.to_string(),
    }
}

#[tokio::test]
async fn artist_get_or_create_is_idempotent() {
    let pool = connect_in_memory().await.unwrap();
    let artists = SqliteArtistRepository::new(pool);

    let first = artists.get_or_create("Daft Punk", Some("UC-dp")).await.unwrap();
    let second = artists.get_or_create("Daft Punk", None).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.channel_id.as_deref(), Some("UC-dp"));
}

#[tokio::test]
async fn album_dedupes_on_title_and_artist_including_null_artist() {
    let pool = connect_in_memory().await.unwrap();
    let artists = SqliteArtistRepository::new(pool.clone());
    let albums = SqliteAlbumRepository::new(pool);

    let artist = artists.get_or_create("Daft Punk", None).await.unwrap();

    let a = albums
        .get_or_create("Discovery", Some(artist.id), Some(2001))
        .await
        .unwrap();
    let b = albums
        .get_or_create("Discovery", Some(artist.id), None)
        .await
        .unwrap();
    assert_eq!(a.id, b.id);

    // Artist-less albums dedupe among themselves too.
    let x = albums.get_or_create("Unknown Sessions", None, None).await.unwrap();
    let y = albums.get_or_create("Unknown Sessions", None, None).await.unwrap();
    assert_eq!(x.id, y.id);

    // But a different artist gets a distinct album row.
    let other = artists.get_or_create("Other", None).await.unwrap();
    let c = albums
        .get_or_create("Discovery", Some(other.id), None)
        .await
        .unwrap();
    assert_ne!(a.id, c.id);
}

#[tokio::test]
async fn tracks_are_unique_per_source_identity() {
    let pool = connect_in_memory().await.unwrap();
    let tracks = SqliteTrackRepository::new(pool);

    assert!(tracks
        .find_by_source("youtube", "abc123")
        .await
        .unwrap()
        .is_none());

    let inserted = tracks.insert(new_track("abc123")).await.unwrap();

    let found = tracks
        .find_by_source("youtube", "abc123")
        .await
        .unwrap()
        .expect("inserted track is findable");
    assert_eq!(found.id, inserted.id);
    assert_eq!(found.title, "One More Time");

    // Second insert with the same identity hits the schema backstop.
    let duplicate = tracks.insert(new_track("abc123")).await;
    assert!(matches!(
        duplicate,
        Err(CatalogError::DuplicateSource { .. })
    ));

    assert_eq!(tracks.count().await.unwrap(), 1);
}

#[tokio::test]
async fn find_by_id_roundtrip() {
    let pool = connect_in_memory().await.unwrap();
    let tracks = SqliteTrackRepository::new(pool);

    let inserted = tracks.insert(new_track("xyz")).await.unwrap();
    let fetched = tracks.find_by_id(&inserted.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, inserted.id);
    assert_eq!(fetched.source_id, "xyz");
    assert_eq!(fetched.duration_seconds, 213);
}
