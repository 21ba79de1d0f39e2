//! Typed configuration for every ingestion component.
//!
//! One struct per component, assembled into [`RitmoConfig`]. The recognized
//! settings and their effects live here and nowhere else — components
//! receive an already-validated struct instead of assembling option bags at
//! call sites. Validation runs at construction and fails fast on fatal
//! problems (empty API key, zero quota ceiling, inverted duration window);
//! everything past construction treats its config as trustworthy.
//!
//! `RitmoConfig::from_env` reads the documented `RITMO_*` environment
//! variables, falling back to defaults for everything except credentials.

use core_resilience::{BreakerPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{Result, RuntimeError};

/// Video search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider API key. Required; construction fails without it.
    pub api_key: String,
    /// Identity sent in the `User-Agent` / quota attribution headers.
    pub application_name: String,
    /// Daily quota ceiling in provider units.
    pub quota_limit_per_day: u64,
    /// Quota units charged per search call.
    pub search_cost: u64,
    /// Quota units charged per batched detail-hydration call.
    pub videos_cost: u64,
    /// Default page size for searches.
    pub max_results: u32,
    /// Seed queries used by random-music requests.
    pub random_query_seeds: Vec<String>,
    pub retry: RetryPolicy,
    pub breaker: BreakerPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            application_name: "ritmo-ingest".to_string(),
            quota_limit_per_day: 10_000,
            search_cost: 100,
            videos_cost: 1,
            max_results: 25,
            random_query_seeds: default_query_seeds(),
            retry: RetryPolicy::default(),
            breaker: BreakerPolicy::default(),
        }
    }
}

fn default_query_seeds() -> Vec<String> {
    [
        "indie rock full song",
        "synthwave mix",
        "jazz classics",
        "lofi hip hop",
        "classical piano performance",
        "electronic dance music",
        "acoustic cover",
        "soul funk groove",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Audio download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Primary backend format selector.
    pub preferred_format: String,
    /// Quality hint passed with the primary attempt.
    pub audio_quality: Option<String>,
    /// Richer fallback selector tried when the primary attempt fails.
    pub fallback_format: String,
    /// Output template used with the fallback attempt.
    pub fallback_output_template: String,
    /// Hard ceiling on downloaded file size.
    pub max_filesize_bytes: u64,
    /// Per-download timeout enforced at the worker-future layer.
    pub download_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            preferred_format: "bestaudio/best".to_string(),
            audio_quality: Some("192K".to_string()),
            fallback_format: "bestaudio[ext=m4a]/bestaudio[ext=webm]/best".to_string(),
            fallback_output_template: "%(id)s.%(ext)s".to_string(),
            max_filesize_bytes: 50 * 1024 * 1024,
            download_timeout_secs: 300,
            retry: RetryPolicy::default(),
        }
    }
}

impl AudioConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Thumbnail fetch/store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    pub max_bytes: u64,
    pub fetch_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            fetch_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl ThumbnailConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Processing pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent pipeline units; the semaphore size.
    pub max_concurrent: usize,
    /// Music processor duration window, in seconds.
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    /// Minimum duration before the podcast processor considers a video.
    pub podcast_min_duration_secs: u64,
    /// Retry policy wrapped around each pipeline unit.
    pub unit_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            min_duration_secs: 30,
            max_duration_secs: 600,
            podcast_min_duration_secs: 300,
            unit_retry: RetryPolicy {
                max_retries: 1,
                ..RetryPolicy::default()
            },
        }
    }
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage service base endpoint, e.g. `https://xyz.supabase.co/storage/v1`.
    pub endpoint: String,
    pub api_key: String,
    pub audio_bucket: String,
    pub thumbnail_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            audio_bucket: "audio".to_string(),
            thumbnail_bucket: "thumbnails".to_string(),
        }
    }
}

/// Catalog database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// sqlx connection string.
    pub database_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ritmo.db?mode=rwc".to_string(),
        }
    }
}

/// Aggregated configuration for the whole ingestion core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RitmoConfig {
    pub search: SearchConfig,
    pub audio: AudioConfig,
    pub thumbnail: ThumbnailConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
}

impl RitmoConfig {
    /// Load configuration from `RITMO_*` environment variables.
    ///
    /// Unset variables fall back to defaults; the result is validated before
    /// being returned, so a missing API key is caught here rather than on
    /// the first network call.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(key) = env::var("RITMO_YOUTUBE_API_KEY") {
            config.search.api_key = key;
        }
        if let Some(limit) = parse_env("RITMO_QUOTA_LIMIT")? {
            config.search.quota_limit_per_day = limit;
        }
        if let Some(max) = parse_env("RITMO_SEARCH_MAX_RESULTS")? {
            config.search.max_results = max;
        }
        if let Ok(seeds) = env::var("RITMO_RANDOM_QUERIES") {
            let seeds: Vec<String> = seeds
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !seeds.is_empty() {
                config.search.random_query_seeds = seeds;
            }
        }
        if let Some(n) = parse_env("RITMO_MAX_CONCURRENT")? {
            config.pipeline.max_concurrent = n;
        }
        if let Some(bytes) = parse_env("RITMO_AUDIO_MAX_BYTES")? {
            config.audio.max_filesize_bytes = bytes;
        }
        if let Some(secs) = parse_env("RITMO_DOWNLOAD_TIMEOUT_SECS")? {
            config.audio.download_timeout_secs = secs;
        }
        if let Ok(endpoint) = env::var("RITMO_STORAGE_ENDPOINT") {
            config.storage.endpoint = endpoint;
        }
        if let Ok(key) = env::var("RITMO_STORAGE_API_KEY") {
            config.storage.api_key = key;
        }
        if let Ok(url) = env::var("RITMO_DATABASE_URL") {
            config.catalog.database_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Fail-fast construction-time validation.
    ///
    /// # Errors
    ///
    /// Fatal, programmer/operator-class problems only: missing credentials,
    /// nonsensical limits. Noisy-data concerns are runtime validation and do
    /// not belong here.
    pub fn validate(&self) -> Result<()> {
        if self.search.api_key.is_empty() {
            return Err(RuntimeError::MissingSetting(
                "search.api_key (RITMO_YOUTUBE_API_KEY)".to_string(),
            ));
        }
        if self.search.quota_limit_per_day == 0 {
            return Err(RuntimeError::InvalidConfig(
                "search.quota_limit_per_day must be positive".to_string(),
            ));
        }
        if self.search.random_query_seeds.is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "search.random_query_seeds must not be empty".to_string(),
            ));
        }
        if self.pipeline.max_concurrent == 0 {
            return Err(RuntimeError::InvalidConfig(
                "pipeline.max_concurrent must be positive".to_string(),
            ));
        }
        if self.pipeline.min_duration_secs >= self.pipeline.max_duration_secs {
            return Err(RuntimeError::InvalidConfig(format!(
                "pipeline duration window is inverted: [{}, {}]",
                self.pipeline.min_duration_secs, self.pipeline.max_duration_secs
            )));
        }
        if self.audio.max_filesize_bytes == 0 {
            return Err(RuntimeError::InvalidConfig(
                "audio.max_filesize_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            RuntimeError::InvalidConfig(format!("{name} has an unparseable value: {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}
