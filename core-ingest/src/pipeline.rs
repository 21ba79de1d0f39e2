//! Processor selection and the concurrent ingestion pipeline.
//!
//! A [`ProcessorRegistry`] picks, per video, the first registered
//! [`VideoProcessor`] whose predicate accepts it; videos nobody accepts are
//! silently dropped — that is filtering, not failure. Accepted units fan
//! out across a semaphore-bounded task set. Each unit runs under its own
//! retry wrapper; individual failures are logged and excluded from the
//! output rather than aborting the batch, and output order is not
//! guaranteed to match input order.

use core_extract::clean::{clean_artist_name, clean_track_title, is_degenerate_title};
use core_extract::EnrichedVideo;
use core_resilience::{FailureKind, Outcome, Retrier, SkipReason};
use core_runtime::config::PipelineConfig;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::processors::{AudioProcessor, StoredAudio, ThumbnailProcessor};
use crate::track::{AudioTrack, SOURCE_TYPE_YOUTUBE};

/// Selection strategy seam: decides whether a processor handles a video.
pub trait VideoProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn accepts(&self, video: &core_extract::VideoInfo) -> bool;

    /// Genre recorded on the track when the video itself carries none.
    fn default_genre(&self) -> Option<&'static str> {
        None
    }
}

/// Accepts plausibly-musical videos: duration inside the configured window
/// and a title that could identify a track.
pub struct MusicVideoProcessor {
    min_duration_secs: u64,
    max_duration_secs: u64,
}

impl MusicVideoProcessor {
    pub fn new(min_duration_secs: u64, max_duration_secs: u64) -> Self {
        Self {
            min_duration_secs,
            max_duration_secs,
        }
    }
}

impl VideoProcessor for MusicVideoProcessor {
    fn name(&self) -> &'static str {
        "music"
    }

    fn accepts(&self, video: &core_extract::VideoInfo) -> bool {
        let duration_ok = (self.min_duration_secs..=self.max_duration_secs)
            .contains(&video.duration_seconds);
        duration_ok && !is_degenerate_title(&video.title)
    }
}

const PODCAST_KEYWORDS: &[&str] = &["podcast", "episode", "interview", "talk show"];

/// Accepts long-form spoken content with podcast-ish titles.
pub struct PodcastProcessor {
    min_duration_secs: u64,
}

impl PodcastProcessor {
    pub fn new(min_duration_secs: u64) -> Self {
        Self { min_duration_secs }
    }
}

impl VideoProcessor for PodcastProcessor {
    fn name(&self) -> &'static str {
        "podcast"
    }

    fn accepts(&self, video: &core_extract::VideoInfo) -> bool {
        if video.duration_seconds < self.min_duration_secs {
            return false;
        }
        let title = video.title.to_lowercase();
        PODCAST_KEYWORDS.iter().any(|kw| title.contains(kw))
    }

    fn default_genre(&self) -> Option<&'static str> {
        Some("Podcast")
    }
}

/// First-match-wins processor selection, in registration order.
pub struct ProcessorRegistry {
    processors: Vec<Box<dyn VideoProcessor>>,
}

impl ProcessorRegistry {
    pub fn new(processors: Vec<Box<dyn VideoProcessor>>) -> Self {
        Self { processors }
    }

    /// Standard registration: music first, podcasts as the long-form catch.
    pub fn standard(config: &PipelineConfig) -> Self {
        Self::new(vec![
            Box::new(MusicVideoProcessor::new(
                config.min_duration_secs,
                config.max_duration_secs,
            )),
            Box::new(PodcastProcessor::new(config.podcast_min_duration_secs)),
        ])
    }

    pub fn select(&self, video: &core_extract::VideoInfo) -> Option<&dyn VideoProcessor> {
        self.processors
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.accepts(video))
    }
}

/// Per-batch knobs.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Download and store audio for each unit (thumbnails are always
    /// processed).
    pub download_audio: bool,
}

/// Unit-level transient failure driving the unit retry wrapper.
struct UnitError(String);

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The concurrent ingestion pipeline.
///
/// The semaphore is pipeline-instance-scoped: two pipelines in one process
/// do not coordinate their concurrency with each other.
pub struct IngestPipeline {
    thumbnails: Arc<ThumbnailProcessor>,
    audio: Arc<AudioProcessor>,
    registry: Arc<ProcessorRegistry>,
    semaphore: Arc<Semaphore>,
    unit_retrier: Retrier,
}

impl IngestPipeline {
    pub fn new(
        thumbnails: Arc<ThumbnailProcessor>,
        audio: Arc<AudioProcessor>,
        registry: Arc<ProcessorRegistry>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            thumbnails,
            audio,
            registry,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            unit_retrier: Retrier::new(config.unit_retry.clone()),
        }
    }

    /// Process a batch of videos into catalog-ready tracks.
    ///
    /// Never fails: per-unit problems reduce the output, nothing more.
    /// There is no batch cancellation — every scheduled unit runs to
    /// completion.
    pub async fn process_videos(
        &self,
        videos: Vec<EnrichedVideo>,
        options: &PipelineOptions,
    ) -> Vec<AudioTrack> {
        let total = videos.len();
        let mut join_set = JoinSet::new();
        let mut scheduled = 0usize;

        for enriched in videos {
            let Some(processor) = self.registry.select(&enriched.info) else {
                debug!(
                    video_id = %enriched.info.video_id,
                    duration = enriched.info.duration_seconds,
                    "no processor accepted the video, dropping"
                );
                continue;
            };
            let processor_name = processor.name();
            let default_genre = processor.default_genre();
            scheduled += 1;

            let semaphore = Arc::clone(&self.semaphore);
            let thumbnails = Arc::clone(&self.thumbnails);
            let audio = Arc::clone(&self.audio);
            let retrier = self.unit_retrier.clone();
            let download_audio = options.download_audio;

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                debug!(
                    video_id = %enriched.info.video_id,
                    processor = processor_name,
                    "processing unit started"
                );
                let outcome = retrier
                    .run(
                        "pipeline-unit",
                        |_: &UnitError| FailureKind::Transient,
                        || {
                            process_unit(
                                Arc::clone(&thumbnails),
                                Arc::clone(&audio),
                                enriched.clone(),
                                default_genre,
                                download_audio,
                            )
                        },
                    )
                    .await;
                match outcome {
                    Outcome::Ok(track) => track,
                    Outcome::Skipped(_) => None,
                }
            });
        }

        let mut tracks = Vec::with_capacity(scheduled);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(track)) => tracks.push(track),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "pipeline unit panicked or was aborted"),
            }
        }

        let succeeded = tracks.len();
        let rate = if scheduled == 0 {
            100.0
        } else {
            succeeded as f64 / scheduled as f64 * 100.0
        };
        info!(
            total,
            scheduled,
            succeeded,
            success_rate_pct = rate as u64,
            "pipeline batch complete"
        );
        tracks
    }
}

/// One video's end-to-end processing: thumbnail, optional audio, assembly.
async fn process_unit(
    thumbnails: Arc<ThumbnailProcessor>,
    audio: Arc<AudioProcessor>,
    enriched: EnrichedVideo,
    default_genre: Option<&'static str>,
    download_audio: bool,
) -> Result<Option<AudioTrack>, UnitError> {
    // A failed thumbnail never sinks the unit; the original remote URL is
    // an acceptable stand-in.
    let stored_thumbnail = match thumbnails.process_thumbnail(&enriched.info).await {
        Outcome::Ok(url) => Some(url),
        Outcome::Skipped(reason) => {
            debug!(video_id = %enriched.info.video_id, %reason, "thumbnail skipped");
            None
        }
    };

    let stored_audio = if download_audio {
        match audio.process_audio(&enriched.info).await {
            Outcome::Ok(stored) => Some(stored),
            Outcome::Skipped(SkipReason::Exhausted { attempts }) => {
                // The inner budget ran dry on transient failures; let the
                // unit wrapper decide whether to grant a fresh one.
                return Err(UnitError(format!(
                    "audio transfer exhausted {attempts} attempts"
                )));
            }
            Outcome::Skipped(reason) => {
                debug!(video_id = %enriched.info.video_id, %reason, "unit skipped");
                return Ok(None);
            }
        }
    } else {
        None
    };

    Ok(Some(assemble_track(
        &enriched,
        stored_thumbnail,
        stored_audio,
        default_genre,
    )))
}

/// Build the terminal track from everything the unit produced.
pub(crate) fn assemble_track(
    enriched: &EnrichedVideo,
    stored_thumbnail: Option<String>,
    stored_audio: Option<StoredAudio>,
    default_genre: Option<&'static str>,
) -> AudioTrack {
    let info = &enriched.info;

    // Top-confidence extracted artist, else the cleaned channel title.
    let artist_name = enriched
        .metadata
        .top_artist()
        .map(|artist| artist.name.clone())
        .unwrap_or_else(|| {
            let cleaned = clean_artist_name(&info.channel_title);
            if cleaned.is_empty() {
                info.channel_title.clone()
            } else {
                cleaned
            }
        });

    let title = {
        let cleaned = clean_track_title(&info.title);
        if cleaned.is_empty() {
            info.title.clone()
        } else {
            cleaned
        }
    };

    let duration_seconds = stored_audio
        .as_ref()
        .and_then(|audio| audio.duration_seconds)
        .unwrap_or(info.duration_seconds);

    AudioTrack {
        source_type: SOURCE_TYPE_YOUTUBE,
        source_id: info.video_id.clone(),
        title,
        artist_name,
        album_title: enriched.metadata.top_album().map(|album| album.title.clone()),
        duration_seconds,
        thumbnail_url: stored_thumbnail.unwrap_or_else(|| info.thumbnail_url.clone()),
        genre: info.genre.clone().or_else(|| default_genre.map(String::from)),
        tags: info.tags.clone(),
        url: info.url.clone(),
        audio_file_data: stored_audio.as_ref().map(|audio| audio.data.clone()),
        audio_file_name: stored_audio.as_ref().map(|audio| audio.key.clone()),
        audio_public_url: stored_audio.as_ref().map(|audio| audio.public_url.clone()),
        audio_sha256: stored_audio.map(|audio| audio.sha256_hex),
        extracted_artists: enriched.metadata.artists.clone(),
        extracted_albums: enriched.metadata.albums.clone(),
    }
}
