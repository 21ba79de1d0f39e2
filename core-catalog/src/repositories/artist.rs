//! Artist repository.

use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

use crate::error::{CatalogError, Result};
use crate::models::{Artist, ArtistId};

#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Fetch the artist with this name, creating it when absent.
    ///
    /// Names are unique; concurrent callers racing on the same name both
    /// receive the surviving row.
    async fn get_or_create(&self, name: &str, channel_id: Option<&str>) -> Result<Artist>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Artist>>;
}

pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn get_or_create(&self, name: &str, channel_id: Option<&str>) -> Result<Artist> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidData(
                "artist name must not be empty".to_string(),
            ));
        }

        sqlx::query(
            "INSERT INTO artists (id, name, channel_id) VALUES (?, ?, ?) \
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(ArtistId::new())
        .bind(name)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        self.find_by_name(name).await?.ok_or_else(|| {
            CatalogError::InvalidData(format!("artist {name:?} vanished after upsert"))
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let artist = query_as::<_, Artist>(
            "SELECT id, name, channel_id FROM artists WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(artist)
    }
}
