//! Regex/heuristic extraction of artist and album candidates.
//!
//! Candidate sources and their confidence, highest first:
//!
//! | source                                   | confidence |
//! |------------------------------------------|------------|
//! | channel name (aggregators filtered out)  | 0.80 |
//! | title `Artist - Title`                   | 0.70 |
//! | title `Artist : Title`                   | 0.65 |
//! | title quoted / `... by Artist` / feat.   | 0.60 |
//! | description `artist:` / `performed by:`  | 0.50 |
//! | tags                                     | 0.30 |
//!
//! Albums follow the same shape: `from/off the album "X"` (0.70),
//! description `album:` lines (0.60), bracketed `[X]` (0.50), tags (0.35),
//! and parenthesized `(X)` last (0.30) since parentheses usually hold noise,
//! not album titles. Candidates are deduplicated case-insensitively keeping
//! the highest-confidence entry, then sorted non-increasing by confidence.
//!
//! Extraction never fails: any input produces a (possibly empty) result.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::trace;

use crate::clean::{
    clean_artist_name, collapse_whitespace, is_non_artist_channel, is_unusable_artist_name,
};
use crate::types::{
    CandidateSource, ExtractedAlbumInfo, ExtractedArtistInfo, ExtractedMetadata, VideoInfo,
};

const CONFIDENCE_CHANNEL: f32 = 0.80;
const CONFIDENCE_TITLE_DASH: f32 = 0.70;
const CONFIDENCE_TITLE_COLON: f32 = 0.65;
const CONFIDENCE_TITLE_WEAK: f32 = 0.60;
const CONFIDENCE_DESCRIPTION: f32 = 0.50;
const CONFIDENCE_TAG: f32 = 0.30;

const CONFIDENCE_ALBUM_PHRASE: f32 = 0.70;
const CONFIDENCE_ALBUM_DESC_LINE: f32 = 0.60;
const CONFIDENCE_ALBUM_BRACKET: f32 = 0.50;
const CONFIDENCE_ALBUM_TAG: f32 = 0.35;
const CONFIDENCE_ALBUM_PAREN: f32 = 0.30;

/// Words whose presence disqualifies an album candidate.
const ALBUM_STOPWORDS: &[&str] = &[
    "official", "live", "remix", "karaoke", "single", "ep", "compilation", "video", "audio",
    "lyrics", "lyric", "cover", "visualizer", "performance", "hd", "4k",
];

static TITLE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^-–—:]+?)\s*[-–—]\s*(.+)$").unwrap());
static TITLE_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-–—:]+?)\s*:\s*(.+)$").unwrap());
static TITLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^["“]([^"”]{2,})["”]"#).unwrap());
static TITLE_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bby\s+([^()\[\]]{2,})$").unwrap());
static TITLE_FEAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:feat\.?|ft\.?)\s+([^()\[\],]{2,})").unwrap());
static DESC_ARTIST_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:artist|performed by)\s*:\s*(.+)$").unwrap());

static ALBUM_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:from|off)(?:\s+the)?\s+album\s+["“]([^"”]+)["”]"#).unwrap()
});
static DESC_ALBUM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*album\s*:\s*(.+)$").unwrap());
static BRACKET_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]{2,})\]").unwrap());
static PAREN_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]{2,})\)").unwrap());
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19[0-9]{2}|20[0-2][0-9])\b").unwrap());
static PAREN_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*(?:19[0-9]{2}|20[0-2][0-9])\s*\)").unwrap());

/// Heuristic artist/album extractor; pure function of its input.
#[derive(Debug, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract ranked artist and album candidates for one video.
    ///
    /// Calling this twice on the same input yields identical results.
    pub fn extract(&self, video: &VideoInfo) -> ExtractedMetadata {
        let artists = dedup_and_rank_artists(self.artist_candidates(video));
        let top_artist = artists.first().map(|a| a.name.clone());
        let albums =
            dedup_and_rank_albums(self.album_candidates(video, top_artist.as_deref()));
        trace!(
            video_id = %video.video_id,
            artists = artists.len(),
            albums = albums.len(),
            "extraction complete"
        );
        ExtractedMetadata { artists, albums }
    }

    fn artist_candidates(&self, video: &VideoInfo) -> Vec<ExtractedArtistInfo> {
        let mut candidates = Vec::new();

        // Channel name, unless it looks like an aggregator or label.
        let channel = clean_artist_name(&video.channel_title);
        if !channel.is_empty()
            && !is_unusable_artist_name(&channel)
            && !is_non_artist_channel(&channel)
        {
            candidates.push(ExtractedArtistInfo {
                name: channel,
                channel_id: Some(video.channel_id.clone()),
                extracted_from: CandidateSource::Channel,
                confidence_score: CONFIDENCE_CHANNEL,
                additional_info: None,
            });
        }

        // Title patterns, strongest shape first.
        let title_patterns: [(&Regex, f32, Option<&str>); 5] = [
            (&*TITLE_DASH, CONFIDENCE_TITLE_DASH, None),
            (&*TITLE_COLON, CONFIDENCE_TITLE_COLON, None),
            (&*TITLE_QUOTED, CONFIDENCE_TITLE_WEAK, None),
            (&*TITLE_BY, CONFIDENCE_TITLE_WEAK, None),
            (&*TITLE_FEAT, CONFIDENCE_TITLE_WEAK, Some("featured")),
        ];
        for (pattern, confidence, note) in title_patterns {
            if let Some(caps) = pattern.captures(&video.title) {
                push_artist(
                    &mut candidates,
                    &caps[1],
                    CandidateSource::Title,
                    confidence,
                    note,
                );
            }
        }

        // Description lines like `Artist: ...` / `Performed by: ...`.
        for caps in DESC_ARTIST_LINE.captures_iter(&video.description) {
            push_artist(
                &mut candidates,
                &caps[1],
                CandidateSource::Description,
                CONFIDENCE_DESCRIPTION,
                None,
            );
        }

        // Tags are the weakest signal; short tags are ignored outright.
        for tag in &video.tags {
            if tag.chars().count() > 2 {
                push_artist(
                    &mut candidates,
                    tag,
                    CandidateSource::Tags,
                    CONFIDENCE_TAG,
                    None,
                );
            }
        }

        candidates
    }

    fn album_candidates(
        &self,
        video: &VideoInfo,
        top_artist: Option<&str>,
    ) -> Vec<ExtractedAlbumInfo> {
        let mut candidates = Vec::new();

        for caps in ALBUM_PHRASE.captures_iter(&video.title) {
            push_album(
                &mut candidates,
                &caps[1],
                top_artist,
                CandidateSource::Title,
                CONFIDENCE_ALBUM_PHRASE,
            );
        }
        for caps in ALBUM_PHRASE.captures_iter(&video.description) {
            push_album(
                &mut candidates,
                &caps[1],
                top_artist,
                CandidateSource::Description,
                CONFIDENCE_ALBUM_PHRASE,
            );
        }
        for caps in DESC_ALBUM_LINE.captures_iter(&video.description) {
            push_album(
                &mut candidates,
                &caps[1],
                top_artist,
                CandidateSource::Description,
                CONFIDENCE_ALBUM_DESC_LINE,
            );
        }
        for caps in BRACKET_GROUP.captures_iter(&video.title) {
            push_album(
                &mut candidates,
                &caps[1],
                top_artist,
                CandidateSource::Title,
                CONFIDENCE_ALBUM_BRACKET,
            );
        }
        for tag in &video.tags {
            if tag.chars().count() > 2 {
                push_album(
                    &mut candidates,
                    tag,
                    top_artist,
                    CandidateSource::Tags,
                    CONFIDENCE_ALBUM_TAG,
                );
            }
        }
        // Parenthesized groups are usually noise, hence the floor confidence.
        for caps in PAREN_GROUP.captures_iter(&video.title) {
            push_album(
                &mut candidates,
                &caps[1],
                top_artist,
                CandidateSource::Title,
                CONFIDENCE_ALBUM_PAREN,
            );
        }

        candidates
    }
}

fn push_artist(
    candidates: &mut Vec<ExtractedArtistInfo>,
    raw: &str,
    source: CandidateSource,
    confidence: f32,
    note: Option<&str>,
) {
    let name = clean_artist_name(raw);
    if name.is_empty() || is_unusable_artist_name(&name) {
        return;
    }
    candidates.push(ExtractedArtistInfo {
        name,
        channel_id: None,
        extracted_from: source,
        confidence_score: confidence,
        additional_info: note.map(String::from),
    });
}

fn push_album(
    candidates: &mut Vec<ExtractedAlbumInfo>,
    raw: &str,
    artist: Option<&str>,
    source: CandidateSource,
    confidence: f32,
) {
    let release_year = YEAR
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i32>().ok());
    let without_year = PAREN_YEAR.replace_all(raw, "");
    let title = collapse_whitespace(&without_year);
    if title.chars().count() < 2 || contains_album_stopword(&title) {
        return;
    }
    candidates.push(ExtractedAlbumInfo {
        title,
        artist_name: artist.map(String::from),
        extracted_from: source,
        confidence_score: confidence,
        release_year,
    });
}

fn contains_album_stopword(title: &str) -> bool {
    title
        .to_lowercase()
        .split_whitespace()
        .any(|word| ALBUM_STOPWORDS.contains(&word))
}

/// Keep the highest-confidence candidate per case-insensitive name, ranked
/// non-increasing by confidence (name as a deterministic tie-break).
fn dedup_and_rank_artists(candidates: Vec<ExtractedArtistInfo>) -> Vec<ExtractedArtistInfo> {
    let mut best: HashMap<String, ExtractedArtistInfo> = HashMap::new();
    for candidate in candidates {
        let key = candidate.name.to_lowercase();
        match best.get(&key) {
            Some(existing) if existing.confidence_score >= candidate.confidence_score => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }
    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

/// Same dedup rule as artists, keyed by `(title, artist_name)` lowercase.
fn dedup_and_rank_albums(candidates: Vec<ExtractedAlbumInfo>) -> Vec<ExtractedAlbumInfo> {
    let mut best: HashMap<(String, String), ExtractedAlbumInfo> = HashMap::new();
    for candidate in candidates {
        let key = (
            candidate.title.to_lowercase(),
            candidate
                .artist_name
                .as_deref()
                .unwrap_or_default()
                .to_lowercase(),
        );
        match best.get(&key) {
            Some(existing) if existing.confidence_score >= candidate.confidence_score => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }
    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.confidence_score
            .total_cmp(&a.confidence_score)
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked
}
