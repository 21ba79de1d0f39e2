//! Pool creation and schema bootstrap.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS artists (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        channel_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS albums (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        artist_id TEXT REFERENCES artists(id),
        release_year INTEGER,
        UNIQUE(title, artist_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tracks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        artist_id TEXT REFERENCES artists(id),
        album_id TEXT REFERENCES albums(id),
        duration_seconds INTEGER NOT NULL DEFAULT 0,
        genre TEXT,
        thumbnail_url TEXT,
        audio_url TEXT,
        audio_object_key TEXT,
        audio_sha256 TEXT,
        source_type TEXT NOT NULL,
        source_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE(source_type, source_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(artist_id)",
    "CREATE INDEX IF NOT EXISTS idx_tracks_album ON tracks(album_id)",
];

/// Connect to the catalog database and ensure the schema exists.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    bootstrap(&pool).await?;
    info!(database_url, "catalog ready");
    Ok(pool)
}

/// In-memory catalog for tests; a single connection keeps one database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    bootstrap(&pool).await?;
    Ok(pool)
}

async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
