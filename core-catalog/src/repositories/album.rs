//! Album repository.

use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

use crate::error::{CatalogError, Result};
use crate::models::{Album, AlbumId, ArtistId};

#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Fetch the `(title, artist)` album, creating it when absent.
    async fn get_or_create(
        &self,
        title: &str,
        artist_id: Option<ArtistId>,
        release_year: Option<i64>,
    ) -> Result<Album>;
}

pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// `IS` instead of `=` so a NULL artist compares as equal to NULL;
    /// the schema's UNIQUE constraint treats NULLs as distinct, so
    /// find-before-insert is what actually dedupes artist-less albums.
    async fn find(&self, title: &str, artist_id: Option<ArtistId>) -> Result<Option<Album>> {
        let album = query_as::<_, Album>(
            "SELECT id, title, artist_id, release_year FROM albums \
             WHERE title = ? AND artist_id IS ?",
        )
        .bind(title)
        .bind(artist_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(album)
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn get_or_create(
        &self,
        title: &str,
        artist_id: Option<ArtistId>,
        release_year: Option<i64>,
    ) -> Result<Album> {
        if title.trim().is_empty() {
            return Err(CatalogError::InvalidData(
                "album title must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self.find(title, artist_id).await? {
            return Ok(existing);
        }

        let album = Album {
            id: AlbumId::new(),
            title: title.to_string(),
            artist_id,
            release_year,
        };
        let inserted = sqlx::query(
            "INSERT INTO albums (id, title, artist_id, release_year) VALUES (?, ?, ?, ?) \
             ON CONFLICT(title, artist_id) DO NOTHING",
        )
        .bind(album.id)
        .bind(&album.title)
        .bind(album.artist_id)
        .bind(album.release_year)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 0 {
            // Lost a race; the winner's row is authoritative.
            return self.find(title, artist_id).await?.ok_or_else(|| {
                CatalogError::InvalidData(format!("album {title:?} vanished after upsert"))
            });
        }
        Ok(album)
    }
}
