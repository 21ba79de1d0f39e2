//! The unified music ingestion façade.
//!
//! Composes search, extraction, and the pipeline into the three calls the
//! rest of the backend uses. Counters are advisory observability, not
//! correctness — they are plain atomics with relaxed ordering.

use core_resilience::{Outcome, SkipReason};
use provider_youtube::{SearchOptions, SearchOrder, VideoSearchService};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::pipeline::{IngestPipeline, PipelineOptions};
use crate::track::AudioTrack;

/// Options for one search-and-process run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub max_results: Option<u32>,
    pub order: SearchOrder,
    /// Download and store audio inline; when `false` the produced tracks
    /// carry metadata and thumbnails only.
    pub download_audio: bool,
    /// Run artist/album extraction over the search results.
    pub extract_metadata: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            max_results: None,
            order: SearchOrder::Relevance,
            download_audio: true,
            extract_metadata: true,
        }
    }
}

/// Advisory service counters.
#[derive(Debug, Default)]
pub struct ServiceStats {
    searches_performed: AtomicU64,
    videos_processed: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time view of [`ServiceStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub searches_performed: u64,
    pub videos_processed: u64,
    pub errors: u64,
}

impl ServiceStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            searches_performed: self.searches_performed.load(Ordering::Relaxed),
            videos_processed: self.videos_processed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Façade over search + extraction + pipeline.
pub struct MusicService {
    search: Arc<VideoSearchService>,
    pipeline: Arc<IngestPipeline>,
    stats: ServiceStats,
}

impl MusicService {
    pub fn new(search: Arc<VideoSearchService>, pipeline: Arc<IngestPipeline>) -> Self {
        Self {
            search,
            pipeline,
            stats: ServiceStats::default(),
        }
    }

    /// Search for videos matching `query` and ingest the usable ones.
    ///
    /// Always returns a (possibly empty) list; an empty result means
    /// "nothing usable found", not an error.
    pub async fn search_and_process_audio(
        &self,
        query: &str,
        options: &ProcessOptions,
    ) -> Vec<AudioTrack> {
        self.stats.searches_performed.fetch_add(1, Ordering::Relaxed);

        let videos = self
            .search
            .search_videos(query, &search_options(options))
            .await;
        self.run_pipeline(videos, options).await
    }

    /// Ingest tracks from a randomly chosen seed query.
    pub async fn get_random_music(&self, options: &ProcessOptions) -> Vec<AudioTrack> {
        self.stats.searches_performed.fetch_add(1, Ordering::Relaxed);

        let videos = self
            .search
            .get_random_videos(&search_options(options))
            .await;
        self.run_pipeline(videos, options).await
    }

    /// Ingest a single known video, downloading its audio.
    pub async fn download_audio_for_video(&self, video_id: &str) -> Outcome<AudioTrack> {
        let enriched = match self.search.get_video_details(video_id).await {
            Outcome::Ok(enriched) => enriched,
            Outcome::Skipped(reason) => return Outcome::Skipped(reason),
        };

        let options = ProcessOptions::default();
        let mut tracks = self.run_pipeline(vec![enriched], &options).await;
        match tracks.pop() {
            Some(track) => Outcome::Ok(track),
            None => Outcome::Skipped(SkipReason::Rejected(
                "video was not ingestable".to_string(),
            )),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    async fn run_pipeline(
        &self,
        videos: Vec<core_extract::EnrichedVideo>,
        options: &ProcessOptions,
    ) -> Vec<AudioTrack> {
        let attempted = videos.len() as u64;
        let pipeline_options = PipelineOptions {
            download_audio: options.download_audio,
        };
        let tracks = self.pipeline.process_videos(videos, &pipeline_options).await;

        let produced = tracks.len() as u64;
        self.stats
            .videos_processed
            .fetch_add(produced, Ordering::Relaxed);
        self.stats
            .errors
            .fetch_add(attempted.saturating_sub(produced), Ordering::Relaxed);
        info!(attempted, produced, "ingestion run complete");
        tracks
    }
}

fn search_options(options: &ProcessOptions) -> SearchOptions {
    SearchOptions {
        max_results: options.max_results,
        order: options.order,
        category_hint: None,
        enrich_metadata: options.extract_metadata,
    }
}
