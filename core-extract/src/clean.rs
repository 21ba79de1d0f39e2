//! Text cleaning and sanity checks shared across the ingestion core.

use once_cell::sync::Lazy;
use regex::Regex;

/// Branding suffixes stripped from the end of artist/channel names.
const NAME_SUFFIXES: &[&str] = &["vevo", "official", "records", "label", "entertainment"];

/// Tokens that are never an artist name on their own.
const GENERIC_TOKENS: &[&str] = &[
    "official", "video", "audio", "remix", "lyrics", "lyric", "live", "cover", "music", "hd",
    "hq", "mv", "full", "version", "channel",
];

/// Channel-name keywords marking aggregator/label channels, not artists.
const NON_ARTIST_CHANNEL_KEYWORDS: &[&str] = &[
    "music", "records", "various", "channel", "tv", "radio", "media", "network", "topic",
    "recordings", "playlist", "mix",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static NOISE_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*[(\[][^)\]]*(?:official|video|audio|lyric|visuali[sz]er|remaster|hd|4k)[^)\]]*[)\]]",
    )
    .unwrap()
});

static DASH_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^-–—:]+?)\s*[-–—]\s*(.+)$").unwrap());

/// Collapse runs of whitespace and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Clean a candidate artist name: collapse whitespace and strip trailing
/// branding suffixes ("Daft PunkVEVO" → "Daft Punk").
pub fn clean_artist_name(raw: &str) -> String {
    let mut name = collapse_whitespace(raw);
    loop {
        let Some(suffix) = NAME_SUFFIXES.iter().find(|s| {
            name.len() >= s.len()
                && name.is_char_boundary(name.len() - s.len())
                && name[name.len() - s.len()..].eq_ignore_ascii_case(s)
        }) else {
            break;
        };
        name.truncate(name.len() - suffix.len());
        name = name.trim_end_matches([' ', '-', '_', '|']).to_string();
        if name.is_empty() {
            break;
        }
    }
    name
}

/// Whether a cleaned name is too generic or too short to be an artist.
pub fn is_unusable_artist_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    name.chars().count() < 2 || GENERIC_TOKENS.contains(&lower.as_str())
}

/// Whether a channel name looks like an aggregator/label rather than the
/// performing artist.
pub fn is_non_artist_channel(cleaned_channel: &str) -> bool {
    let lower = cleaned_channel.to_lowercase();
    NON_ARTIST_CHANNEL_KEYWORDS
        .iter()
        .any(|kw| lower.split_whitespace().any(|word| word == *kw))
}

/// Clean a video title into a plausible track title: drop noise groups like
/// `(Official Video)` and, when the title has `Artist - Title` shape, keep
/// only the title side.
pub fn clean_track_title(raw: &str) -> String {
    let stripped = NOISE_GROUP.replace_all(raw, "");
    let stripped = collapse_whitespace(&stripped);
    match DASH_SPLIT.captures(&stripped) {
        Some(caps) => collapse_whitespace(&caps[2]),
        None => stripped,
    }
}

/// A title too short or too repetitive to ever identify a track.
pub fn is_degenerate_title(title: &str) -> bool {
    let cleaned = collapse_whitespace(title);
    if cleaned.chars().count() < 3 {
        return true;
    }
    let mut chars = cleaned.chars().filter(|c| c.is_alphanumeric());
    let Some(first) = chars.next() else {
        return true;
    };
    chars.all(|c| c.eq_ignore_ascii_case(&first))
}

/// Minimal URL sanity check for fetch targets.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
