//! Track repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, query_scalar, SqlitePool};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::{NewTrack, Track, TrackId};

#[async_trait]
pub trait TrackRepository: Send + Sync {
    async fn find_by_id(&self, id: &TrackId) -> Result<Option<Track>>;

    /// Look a track up by its `(source_type, source_id)` identity — the
    /// dedup check callers run before persisting ingestion output.
    async fn find_by_source(&self, source_type: &str, source_id: &str)
        -> Result<Option<Track>>;

    /// Insert a new track.
    ///
    /// # Errors
    ///
    /// [`CatalogError::DuplicateSource`] when a row with the same source
    /// identity already exists — the schema-level backstop behind
    /// [`TrackRepository::find_by_source`].
    async fn insert(&self, new_track: NewTrack) -> Result<Track>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const TRACK_COLUMNS: &str = "id, title, artist_id, album_id, duration_seconds, genre, \
     thumbnail_url, audio_url, audio_object_key, audio_sha256, source_type, source_id, \
     created_at";

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &TrackId) -> Result<Option<Track>> {
        let track = query_as::<_, Track>(&format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    async fn find_by_source(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<Track>> {
        let track = query_as::<_, Track>(&format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE source_type = ? AND source_id = ?"
        ))
        .bind(source_type)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(track)
    }

    async fn insert(&self, new_track: NewTrack) -> Result<Track> {
        let track = Track {
            id: TrackId::new(),
            title: new_track.title,
            artist_id: new_track.artist_id,
            album_id: new_track.album_id,
            duration_seconds: new_track.duration_seconds,
            genre: new_track.genre,
            thumbnail_url: new_track.thumbnail_url,
            audio_url: new_track.audio_url,
            audio_object_key: new_track.audio_object_key,
            audio_sha256: new_track.audio_sha256,
            source_type: new_track.source_type,
            source_id: new_track.source_id,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO tracks (id, title, artist_id, album_id, duration_seconds, genre, \
             thumbnail_url, audio_url, audio_object_key, audio_sha256, source_type, \
             source_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(track.id)
        .bind(&track.title)
        .bind(track.artist_id)
        .bind(track.album_id)
        .bind(track.duration_seconds)
        .bind(&track.genre)
        .bind(&track.thumbnail_url)
        .bind(&track.audio_url)
        .bind(&track.audio_object_key)
        .bind(&track.audio_sha256)
        .bind(&track.source_type)
        .bind(&track.source_id)
        .bind(track.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(track_id = %track.id, source_id = %track.source_id, "track persisted");
                Ok(track)
            }
            Err(sqlx::Error::Database(db_err))
                if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(CatalogError::DuplicateSource {
                    source_type: track.source_type,
                    source_id: track.source_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
