//! Music metadata extraction from noisy video metadata.
//!
//! Remote videos arrive with free-text titles, descriptions, and tags.
//! This crate turns that text into ranked artist and album candidates with
//! confidence scores — hints for downstream confirmation, not ground truth.
//! False positives and negatives are expected and acceptable.

pub mod clean;
pub mod extractor;
pub mod types;

pub use extractor::MetadataExtractor;
pub use types::{
    CandidateSource, EnrichedVideo, ExtractedAlbumInfo, ExtractedArtistInfo, ExtractedMetadata,
    VideoInfo,
};
