//! SQLite catalog for ingested tracks.
//!
//! The catalog is the dedup boundary of the ingestion core: every track
//! carries a `(source_type, source_id)` identity, enforced unique at the
//! schema level, and callers look tracks up by that identity before
//! persisting. Repositories follow the trait + SQLite-implementation split
//! so tests and alternative stores can swap in.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::connect;
pub use error::{CatalogError, Result};
pub use models::{Album, AlbumId, Artist, ArtistId, NewTrack, Track, TrackId};
pub use repositories::{
    AlbumRepository, ArtistRepository, SqliteAlbumRepository, SqliteArtistRepository,
    SqliteTrackRepository, TrackRepository,
};
