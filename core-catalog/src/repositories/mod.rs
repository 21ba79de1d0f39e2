//! Repository traits and their SQLite implementations.

mod album;
mod artist;
mod track;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use track::{SqliteTrackRepository, TrackRepository};
