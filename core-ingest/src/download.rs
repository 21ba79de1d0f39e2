//! Audio download orchestration.
//!
//! The blocking backend call runs in a scratch directory on a worker
//! thread, bounded by the configured timeout. One attempt tries the primary
//! format preferences first and falls back to the richer set before giving
//! up; the attempt as a whole sits inside the service's retry loop.

use bytes::Bytes;
use core_resilience::{Outcome, Retrier};
use core_runtime::config::AudioConfig;
use gateway_traits::{AudioBackend, AudioProbe, FormatPreferences, GatewayError};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Extensions accepted as a download result.
const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "webm", "opus", "ogg", "aac", "flac", "wav"];

/// Extensions lofty can parse for the advisory decodability probe. The webm
/// container is excluded: it is a legitimate download result but not a
/// format lofty reads.
const PROBEABLE_EXTENSIONS: &[&str] = &["m4a", "mp3", "opus", "ogg", "aac", "flac", "wav"];

/// A validated, fully buffered download.
#[derive(Debug, Clone)]
pub struct DownloadedAudio {
    pub data: Bytes,
    /// Filename the backend produced inside the scratch directory.
    pub file_name: String,
    pub extension: String,
    /// Duration read from the payload itself, when the container is
    /// parseable; advisory only.
    pub probed_duration_seconds: Option<u64>,
}

/// Downloads best-audio streams through the extraction backend.
pub struct AudioDownloadService {
    backend: Arc<dyn AudioBackend>,
    config: AudioConfig,
    retrier: Retrier,
}

impl AudioDownloadService {
    pub fn new(backend: Arc<dyn AudioBackend>, config: AudioConfig) -> Self {
        let retrier = Retrier::new(config.retry.clone());
        Self {
            backend,
            config,
            retrier,
        }
    }

    /// Download the audio stream for `url` into memory.
    ///
    /// Expected failures — content gone, oversized payload, no usable file,
    /// retries exhausted, timeout — surface as [`Outcome::Skipped`]; the
    /// caller is never left hanging and never sees an error.
    pub async fn download_audio(&self, url: &str) -> Outcome<DownloadedAudio> {
        if !core_extract::clean::is_http_url(url) {
            return Outcome::Skipped(core_resilience::SkipReason::Rejected(format!(
                "not a fetchable URL: {url}"
            )));
        }

        self.retrier
            .run("audio-download", IngestError::failure_kind, || {
                self.attempt(url)
            })
            .await
    }

    /// Metadata-only probe with the same offload and timeout discipline.
    pub async fn audio_info(&self, url: &str) -> Outcome<AudioProbe> {
        if !core_extract::clean::is_http_url(url) {
            return Outcome::Skipped(core_resilience::SkipReason::Rejected(format!(
                "not a fetchable URL: {url}"
            )));
        }

        let backend = Arc::clone(&self.backend);
        let owned_url = url.to_string();
        let result = self
            .bounded_blocking(move || backend.probe(&owned_url).map_err(IngestError::from))
            .await;

        match result {
            Ok(probe) => Outcome::Ok(probe),
            Err(err) => {
                warn!(url, error = %err, "audio probe failed");
                Outcome::rejected(err.to_string())
            }
        }
    }

    /// One retryable attempt: primary preferences, then the fallback set.
    async fn attempt(&self, url: &str) -> Result<DownloadedAudio> {
        let primary = FormatPreferences {
            format: self.config.preferred_format.clone(),
            audio_quality: self.config.audio_quality.clone(),
            output_template: None,
        };
        match self.attempt_with(url, primary).await {
            Ok(audio) => Ok(audio),
            Err(IngestError::Gateway(GatewayError::Unavailable(reason))) => {
                // Permanent; the fallback format cannot resurrect the video.
                Err(IngestError::Gateway(GatewayError::Unavailable(reason)))
            }
            Err(primary_err) => {
                debug!(url, error = %primary_err, "primary format set failed, trying fallback");
                let fallback = FormatPreferences {
                    format: self.config.fallback_format.clone(),
                    audio_quality: None,
                    output_template: Some(self.config.fallback_output_template.clone()),
                };
                self.attempt_with(url, fallback).await
            }
        }
    }

    async fn attempt_with(&self, url: &str, prefs: FormatPreferences) -> Result<DownloadedAudio> {
        let backend = Arc::clone(&self.backend);
        let owned_url = url.to_string();
        let max_bytes = self.config.max_filesize_bytes;
        self.bounded_blocking(move || download_sync(&*backend, &owned_url, &prefs, max_bytes))
            .await
    }

    /// Offload a blocking closure and bound it with the configured timeout.
    ///
    /// An elapsed timeout abandons the worker future and reports
    /// [`IngestError::Timeout`]; the backend's own process-level timeout
    /// reaps the subprocess so nothing leaks.
    async fn bounded_blocking<T: Send + 'static>(
        &self,
        work: impl FnOnce() -> Result<T> + Send + 'static,
    ) -> Result<T> {
        let seconds = self.config.download_timeout_secs;
        let handle = tokio::task::spawn_blocking(work);
        match tokio::time::timeout(self.config.download_timeout(), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(IngestError::TaskJoin(join_err.to_string())),
            Err(_elapsed) => {
                warn!(seconds, "blocking download did not finish in time");
                Err(IngestError::Timeout { seconds })
            }
        }
    }
}

/// Synchronous download core: scratch dir, backend invocation, result scan,
/// size validation, full read. No retry at this layer.
fn download_sync(
    backend: &dyn AudioBackend,
    url: &str,
    prefs: &FormatPreferences,
    max_bytes: u64,
) -> Result<DownloadedAudio> {
    let scratch = tempfile::tempdir()?;
    backend.download(url, prefs, scratch.path())?;

    let path = find_audio_file(scratch.path())?;
    let size = std::fs::metadata(&path)?.len();
    if size > max_bytes {
        return Err(IngestError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let probed_duration_seconds = probe_duration(&path, &extension);

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let data = Bytes::from(std::fs::read(&path)?);

    debug!(
        url,
        file = %file_name,
        bytes = data.len(),
        "audio downloaded and validated"
    );
    Ok(DownloadedAudio {
        data,
        file_name,
        extension,
        probed_duration_seconds,
    })
}

/// Largest file in the scratch directory carrying an allowed extension.
fn find_audio_file(dir: &Path) -> Result<PathBuf> {
    let mut best: Option<(u64, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let size = entry.metadata()?.len();
        if best.as_ref().map(|(s, _)| size > *s).unwrap_or(true) {
            best = Some((size, path));
        }
    }
    best.map(|(_, path)| path).ok_or(IngestError::NoAudioFile)
}

/// Advisory decodability check: parse the payload with lofty and read its
/// duration. Failures are logged, not fatal — the extension allow-list is
/// the hard gate.
fn probe_duration(path: &Path, extension: &str) -> Option<u64> {
    if !PROBEABLE_EXTENSIONS.contains(&extension) {
        return None;
    }
    match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(tagged) => Some(tagged.properties().duration().as_secs()),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "payload did not parse as audio");
            None
        }
    }
}
