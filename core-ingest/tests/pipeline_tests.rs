//! Integration tests for the concurrent ingestion pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use core_extract::{EnrichedVideo, VideoInfo};
use core_ingest::{
    AudioDownloadService, AudioProcessor, IngestPipeline, PipelineOptions, ProcessorRegistry,
    ThumbnailProcessor,
};
use core_resilience::RetryPolicy;
use core_runtime::config::{AudioConfig, PipelineConfig, ThumbnailConfig};
use gateway_traits::{
    AudioBackend, AudioProbe, FormatPreferences, GatewayError, HttpClient, HttpRequest,
    HttpResponse, ObjectStore,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

struct MemoryStore;

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        _bucket: &str,
        _key: &str,
        _data: Bytes,
        _content_type: &str,
    ) -> gateway_traits::Result<()> {
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://store.example/{bucket}/{key}")
    }

    async fn delete(&self, _bucket: &str, _key: &str) -> gateway_traits::Result<bool> {
        Ok(true)
    }
}

struct OkHttp;

#[async_trait]
impl HttpClient for OkHttp {
    async fn execute(&self, _request: HttpRequest) -> gateway_traits::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"jpeg"),
        })
    }
}

/// Fails downloads whose URL contains "bad"; tracks concurrent callers.
struct SelectiveBackend {
    in_flight: AtomicI64,
    max_in_flight: AtomicI64,
    calls: AtomicU32,
}

impl SelectiveBackend {
    fn new() -> Self {
        Self {
            in_flight: AtomicI64::new(0),
            max_in_flight: AtomicI64::new(0),
            calls: AtomicU32::new(0),
        }
    }
}

impl AudioBackend for SelectiveBackend {
    fn download(
        &self,
        url: &str,
        _prefs: &FormatPreferences,
        dest_dir: &Path,
    ) -> gateway_traits::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(50));
        let result = if url.contains("bad") {
            Err(GatewayError::Unavailable("gone".to_string()))
        } else {
            std::fs::write(dest_dir.join("audio.m4a"), b"payload").map_err(Into::into)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn probe(&self, _url: &str) -> gateway_traits::Result<AudioProbe> {
        unimplemented!()
    }
}

fn video(id: &str, url: &str) -> EnrichedVideo {
    EnrichedVideo::bare(VideoInfo {
        video_id: id.to_string(),
        title: format!("Artist - Song {id}"),
        channel_title: "Artist".to_string(),
        channel_id: "chan".to_string(),
        thumbnail_url: "https://img.example/t.jpg".to_string(),
        description: String::new(),
        duration_seconds: 240,
        published_at: None,
        view_count: 0,
        like_count: 0,
        tags: vec![],
        category_id: None,
        genre: None,
        url: url.to_string(),
    })
}

fn pipeline(backend: Arc<SelectiveBackend>, max_concurrent: usize) -> IngestPipeline {
    let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore);
    let config = PipelineConfig {
        max_concurrent,
        unit_retry: RetryPolicy::immediate(0),
        ..PipelineConfig::default()
    };
    let downloader = Arc::new(AudioDownloadService::new(
        backend,
        AudioConfig {
            retry: RetryPolicy::immediate(0),
            ..AudioConfig::default()
        },
    ));
    let thumbnails = Arc::new(ThumbnailProcessor::new(
        Arc::new(OkHttp),
        Arc::clone(&store),
        "thumbnails",
        ThumbnailConfig {
            retry: RetryPolicy::immediate(0),
            ..ThumbnailConfig::default()
        },
    ));
    let audio = Arc::new(AudioProcessor::new(
        downloader,
        store,
        "audio",
        RetryPolicy::immediate(0),
    ));
    IngestPipeline::new(
        thumbnails,
        audio,
        Arc::new(ProcessorRegistry::standard(&config)),
        &config,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failing_units_reduce_output_without_aborting_the_batch() {
    let backend = Arc::new(SelectiveBackend::new());
    let pipeline = pipeline(Arc::clone(&backend), 4);

    // N = 6 units, K = 2 fail inside processing.
    let videos = vec![
        video("a", "https://yt.example/a"),
        video("b", "https://yt.example/bad-b"),
        video("c", "https://yt.example/c"),
        video("d", "https://yt.example/d"),
        video("e", "https://yt.example/bad-e"),
        video("f", "https://yt.example/f"),
    ];

    let tracks = pipeline
        .process_videos(videos, &PipelineOptions { download_audio: true })
        .await;

    assert_eq!(tracks.len(), 4);
    let mut ids: Vec<_> = tracks.iter().map(|t| t.source_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "c", "d", "f"]);
    for track in &tracks {
        assert_eq!(track.source_type, "youtube");
        assert!(track.audio_file_data.is_some());
        assert!(track.audio_sha256.is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrency_stays_under_the_semaphore_bound() {
    let backend = Arc::new(SelectiveBackend::new());
    let pipeline = pipeline(Arc::clone(&backend), 2);

    let videos: Vec<_> = (0..8)
        .map(|i| video(&format!("v{i}"), &format!("https://yt.example/v{i}")))
        .collect();

    let tracks = pipeline
        .process_videos(videos, &PipelineOptions { download_audio: true })
        .await;

    assert_eq!(tracks.len(), 8);
    assert!(
        backend.max_in_flight.load(Ordering::SeqCst) <= 2,
        "semaphore bound exceeded: {}",
        backend.max_in_flight.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn unmatched_videos_are_silently_dropped() {
    let backend = Arc::new(SelectiveBackend::new());
    let pipeline = pipeline(Arc::clone(&backend), 2);

    // 5s long: below the music window, no podcast keyword.
    let videos = vec![video("tiny", "https://yt.example/tiny")];
    let mut tiny = videos;
    tiny[0].info.duration_seconds = 5;

    let tracks = pipeline
        .process_videos(tiny, &PipelineOptions { download_audio: true })
        .await;

    assert!(tracks.is_empty());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0, "unit still ran");
}

#[tokio::test]
async fn metadata_only_runs_skip_the_downloader() {
    let backend = Arc::new(SelectiveBackend::new());
    let pipeline = pipeline(Arc::clone(&backend), 2);

    let tracks = pipeline
        .process_videos(
            vec![video("m", "https://yt.example/m")],
            &PipelineOptions {
                download_audio: false,
            },
        )
        .await;

    assert_eq!(tracks.len(), 1);
    assert!(tracks[0].audio_file_data.is_none());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}
