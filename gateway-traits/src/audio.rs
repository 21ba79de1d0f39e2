//! Audio extraction backend abstraction.
//!
//! Wraps whatever tool turns a video URL into an audio file on disk
//! (yt-dlp in production). The trait is deliberately blocking: the real
//! backend is a subprocess, and `core-ingest` owns the spawn-blocking and
//! timeout discipline around it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Format/quality preferences for one download attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatPreferences {
    /// Backend format selector, e.g. `bestaudio/best`.
    pub format: String,
    /// Target audio quality hint, backend-specific (e.g. `192K`).
    pub audio_quality: Option<String>,
    /// Output filename template; backend default when `None`.
    pub output_template: Option<String>,
}

impl FormatPreferences {
    pub fn best_audio() -> Self {
        Self {
            format: "bestaudio/best".to_string(),
            audio_quality: None,
            output_template: None,
        }
    }
}

/// Metadata-only probe result; no media is downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioProbe {
    pub title: String,
    pub duration_seconds: u64,
    pub uploader: Option<String>,
    /// Human-readable summaries of the formats the backend offered.
    pub formats: Vec<String>,
}

/// Blocking audio extraction seam.
///
/// Implementations must be safe to call from `spawn_blocking` and must not
/// outlive their subprocess: a killed backend leaves no zombies behind.
pub trait AudioBackend: Send + Sync {
    /// Download the best matching audio stream for `url` into `dest_dir`.
    ///
    /// The backend chooses the filename; callers scan `dest_dir` afterwards.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the remote content is gone (private, deleted,
    /// region-blocked) — retrying cannot help. `OperationFailed` for
    /// transient extraction problems.
    fn download(&self, url: &str, prefs: &FormatPreferences, dest_dir: &Path) -> Result<()>;

    /// Fetch stream metadata without downloading media.
    fn probe(&self, url: &str) -> Result<AudioProbe>;
}
