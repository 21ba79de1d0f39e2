//! The video-to-track ingestion pipeline.
//!
//! Turns raw video metadata into catalog-ready audio tracks: download the
//! best audio stream, validate it, push audio and thumbnail into object
//! storage, and assemble an [`AudioTrack`] carrying the extraction results
//! and the `(source_type, source_id)` identity the catalog dedupes on.
//!
//! Concurrency model: the pipeline fans units out under an instance-scoped
//! semaphore; blocking downloader calls are offloaded to worker threads and
//! bounded by an explicit timeout. Expected failures never escape as errors
//! — a batch call always returns the (possibly empty) list of successes.

pub mod download;
pub mod error;
pub mod pipeline;
pub mod processors;
pub mod service;
pub mod track;

pub use download::{AudioDownloadService, DownloadedAudio};
pub use error::{IngestError, Result};
pub use pipeline::{
    IngestPipeline, MusicVideoProcessor, PipelineOptions, PodcastProcessor, ProcessorRegistry,
    VideoProcessor,
};
pub use processors::{AudioProcessor, StoredAudio, ThumbnailProcessor};
pub use service::{MusicService, ProcessOptions, ServiceStats, StatsSnapshot};
pub use track::{AudioTrack, SOURCE_TYPE_YOUTUBE};
