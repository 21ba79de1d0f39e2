//! The terminal output type of the ingestion pipeline.

use bytes::Bytes;
use core_extract::{ExtractedAlbumInfo, ExtractedArtistInfo};

/// Source type recorded for every track this pipeline produces.
pub const SOURCE_TYPE_YOUTUBE: &str = "youtube";

/// One ingested track, ready for catalog persistence.
///
/// Constructed once per video and never mutated afterwards; persistence may
/// assign a catalog id but does not alter these fields. The
/// `(source_type, source_id)` pair is always populated so the catalog
/// boundary can deduplicate — the pipeline itself performs no lookups.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub source_type: &'static str,
    /// The remote video id.
    pub source_id: String,
    pub title: String,
    pub artist_name: String,
    pub album_title: Option<String>,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
    pub genre: Option<String>,
    pub tags: Vec<String>,
    pub url: String,
    /// Downloaded audio payload, when audio download was requested.
    pub audio_file_data: Option<Bytes>,
    /// Object-store key of the uploaded payload.
    pub audio_file_name: Option<String>,
    /// Public URL resolving that key.
    pub audio_public_url: Option<String>,
    /// Hex digest of the payload, for content-level duplicate detection.
    pub audio_sha256: Option<String>,
    pub extracted_artists: Vec<ExtractedArtistInfo>,
    pub extracted_albums: Vec<ExtractedAlbumInfo>,
}
