//! Data types flowing through extraction and ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a remote video.
///
/// Produced by the search adapter, consumed read-only by everything
/// downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub channel_id: String,
    pub thumbnail_url: String,
    pub description: String,
    pub duration_seconds: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub genre: Option<String>,
    pub url: String,
}

impl VideoInfo {
    /// Canonical watch URL for a video id.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }
}

/// Where a candidate was extracted from; also its confidence precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Title,
    Description,
    Channel,
    Tags,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Channel => "channel",
            Self::Tags => "tags",
        }
    }
}

/// One artist candidate. Many may exist per video; they are deduplicated
/// case-insensitively by name, keeping the highest-confidence one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArtistInfo {
    pub name: String,
    pub channel_id: Option<String>,
    pub extracted_from: CandidateSource,
    /// In `[0, 1]`; how likely this candidate is actually the artist.
    pub confidence_score: f32,
    pub additional_info: Option<String>,
}

/// One album candidate, deduplicated by `(title, artist_name)` lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAlbumInfo {
    pub title: String,
    pub artist_name: Option<String>,
    pub extracted_from: CandidateSource,
    pub confidence_score: f32,
    pub release_year: Option<i32>,
}

/// Ranked extraction results for one video.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Sorted non-increasing by confidence.
    pub artists: Vec<ExtractedArtistInfo>,
    pub albums: Vec<ExtractedAlbumInfo>,
}

impl ExtractedMetadata {
    pub fn top_artist(&self) -> Option<&ExtractedArtistInfo> {
        self.artists.first()
    }

    pub fn top_album(&self) -> Option<&ExtractedAlbumInfo> {
        self.albums.first()
    }
}

/// A video plus whatever extraction produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedVideo {
    pub info: VideoInfo,
    pub metadata: ExtractedMetadata,
}

impl EnrichedVideo {
    pub fn bare(info: VideoInfo) -> Self {
        Self {
            info,
            metadata: ExtractedMetadata::default(),
        }
    }
}
