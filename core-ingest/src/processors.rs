//! Per-video fetch-then-store helpers.
//!
//! Each processor wraps one binary transfer — thumbnail or audio — with the
//! retry loop, validates the payload, and stores it under a key namespaced
//! by video id plus a short random suffix so re-ingesting the same video
//! never collides with an earlier artifact.

use bytes::Bytes;
use core_extract::clean::is_http_url;
use core_extract::VideoInfo;
use core_resilience::{Outcome, Retrier};
use core_runtime::config::ThumbnailConfig;
use gateway_traits::{HttpClient, HttpRequest, ObjectStore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::download::AudioDownloadService;
use crate::error::IngestError;

/// Short random key suffix; enough entropy to avoid collisions between
/// repeated ingestions of the same video.
fn key_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "opus" => "audio/opus",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// Downloads a video's thumbnail and stores it publicly.
pub struct ThumbnailProcessor {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    config: ThumbnailConfig,
    retrier: Retrier,
}

impl ThumbnailProcessor {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        config: ThumbnailConfig,
    ) -> Self {
        let retrier = Retrier::new(config.retry.clone());
        Self {
            http,
            store,
            bucket: bucket.into(),
            config,
            retrier,
        }
    }

    /// Fetch and store the thumbnail; yields the stored public URL.
    pub async fn process_thumbnail(&self, video: &VideoInfo) -> Outcome<String> {
        if !is_http_url(&video.thumbnail_url) {
            return Outcome::rejected("video has no fetchable thumbnail");
        }

        let key = format!("{}-{}.jpg", video.video_id, key_suffix());
        self.retrier
            .run("thumbnail", IngestError::failure_kind, || {
                self.fetch_and_store(video, &key)
            })
            .await
    }

    async fn fetch_and_store(
        &self,
        video: &VideoInfo,
        key: &str,
    ) -> Result<String, IngestError> {
        let request = HttpRequest::get(&video.thumbnail_url).timeout(self.config.fetch_timeout());
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(response.into_error().into());
        }

        let size = response.body.len() as u64;
        if size > self.config.max_bytes {
            return Err(IngestError::TooLarge {
                size,
                limit: self.config.max_bytes,
            });
        }

        let content_type = response
            .headers
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| "image/jpeg".to_string());
        self.store
            .put(&self.bucket, key, response.body, &content_type)
            .await?;

        let url = self.store.public_url(&self.bucket, key);
        debug!(video_id = %video.video_id, key, "thumbnail stored");
        Ok(url)
    }
}

/// Audio payload after download and upload.
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub data: Bytes,
    /// Object-store key of the uploaded payload.
    pub key: String,
    /// Public URL resolving that key.
    pub public_url: String,
    pub sha256_hex: String,
    /// Duration probed from the payload itself, when parseable.
    pub duration_seconds: Option<u64>,
}

/// Downloads a video's audio and stores it.
pub struct AudioProcessor {
    downloader: Arc<AudioDownloadService>,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    retrier: Retrier,
}

impl AudioProcessor {
    /// `upload_retry` guards only the store step; the download service owns
    /// its own retry loop.
    pub fn new(
        downloader: Arc<AudioDownloadService>,
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        upload_retry: core_resilience::RetryPolicy,
    ) -> Self {
        Self {
            downloader,
            store,
            bucket: bucket.into(),
            retrier: Retrier::new(upload_retry),
        }
    }

    /// Download, digest, and store the audio for one video.
    pub async fn process_audio(&self, video: &VideoInfo) -> Outcome<StoredAudio> {
        let audio = match self.downloader.download_audio(&video.url).await {
            Outcome::Ok(audio) => audio,
            Outcome::Skipped(reason) => {
                debug!(video_id = %video.video_id, %reason, "audio download skipped");
                return Outcome::Skipped(reason);
            }
        };

        let sha256_hex = hex_digest(&audio.data);
        let key = format!(
            "{}-{}.{}",
            video.video_id,
            key_suffix(),
            audio.extension
        );
        let content_type = content_type_for_extension(&audio.extension);

        let upload = self
            .retrier
            .run("audio-upload", IngestError::failure_kind, || async {
                self.store
                    .put(&self.bucket, &key, audio.data.clone(), content_type)
                    .await
                    .map_err(IngestError::from)
            })
            .await;

        match upload {
            Outcome::Ok(()) => Outcome::Ok(StoredAudio {
                duration_seconds: audio.probed_duration_seconds,
                data: audio.data,
                public_url: self.store.public_url(&self.bucket, &key),
                key,
                sha256_hex,
            }),
            Outcome::Skipped(reason) => {
                warn!(video_id = %video.video_id, %reason, "audio upload failed");
                Outcome::Skipped(reason)
            }
        }
    }
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_resilience::RetryPolicy;
    use core_runtime::config::AudioConfig;
    use gateway_traits::{AudioBackend, AudioProbe, FormatPreferences, HttpResponse};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    struct MemoryStore {
        objects: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            data: Bytes,
            _content_type: &str,
        ) -> gateway_traits::Result<()> {
            self.objects
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string(), data.len()));
            Ok(())
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("https://store.example/{bucket}/{key}")
        }

        async fn delete(&self, _bucket: &str, _key: &str) -> gateway_traits::Result<bool> {
            Ok(false)
        }
    }

    struct FixedHttp {
        status: u16,
        body: &'static [u8],
    }

    #[async_trait]
    impl HttpClient for FixedHttp {
        async fn execute(&self, _request: HttpRequest) -> gateway_traits::Result<HttpResponse> {
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::from([(
                    "content-type".to_string(),
                    "image/jpeg".to_string(),
                )]),
                body: Bytes::from_static(self.body),
            })
        }
    }

    struct OneFileBackend;

    impl AudioBackend for OneFileBackend {
        fn download(
            &self,
            _url: &str,
            _prefs: &FormatPreferences,
            dest_dir: &Path,
        ) -> gateway_traits::Result<()> {
            std::fs::write(dest_dir.join("song.m4a"), b"audio-bytes")?;
            Ok(())
        }

        fn probe(&self, _url: &str) -> gateway_traits::Result<AudioProbe> {
            unimplemented!()
        }
    }

    fn video() -> VideoInfo {
        VideoInfo {
            video_id: "vid42".to_string(),
            title: "Test".to_string(),
            channel_title: "Chan".to_string(),
            channel_id: "c1".to_string(),
            thumbnail_url: "https://img.example/max.jpg".to_string(),
            description: String::new(),
            duration_seconds: 200,
            published_at: None,
            view_count: 0,
            like_count: 0,
            tags: vec![],
            category_id: None,
            genre: None,
            url: "https://www.youtube.com/watch?v=vid42".to_string(),
        }
    }

    fn thumb_config() -> ThumbnailConfig {
        ThumbnailConfig {
            retry: RetryPolicy::immediate(0),
            ..ThumbnailConfig::default()
        }
    }

    #[tokio::test]
    async fn thumbnail_key_is_namespaced_by_video_id() {
        let store = Arc::new(MemoryStore {
            objects: Mutex::new(vec![]),
        });
        let processor = ThumbnailProcessor::new(
            Arc::new(FixedHttp {
                status: 200,
                body: b"jpeg-bytes",
            }),
            store.clone(),
            "thumbnails",
            thumb_config(),
        );

        let url = processor.process_thumbnail(&video()).await.ok().unwrap();

        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        let (bucket, key, size) = &objects[0];
        assert_eq!(bucket, "thumbnails");
        assert!(key.starts_with("vid42-"), "key not namespaced: {key}");
        assert_eq!(*size, b"jpeg-bytes".len());
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn oversized_thumbnail_is_skipped() {
        let store = Arc::new(MemoryStore {
            objects: Mutex::new(vec![]),
        });
        let mut config = thumb_config();
        config.max_bytes = 4;
        let processor = ThumbnailProcessor::new(
            Arc::new(FixedHttp {
                status: 200,
                body: b"way more than four bytes",
            }),
            store.clone(),
            "thumbnails",
            config,
        );

        let outcome = processor.process_thumbnail(&video()).await;

        assert!(!outcome.is_ok());
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_thumbnail_url_short_circuits() {
        let store = Arc::new(MemoryStore {
            objects: Mutex::new(vec![]),
        });
        let processor = ThumbnailProcessor::new(
            Arc::new(FixedHttp {
                status: 200,
                body: b"",
            }),
            store,
            "thumbnails",
            thumb_config(),
        );

        let mut no_thumb = video();
        no_thumb.thumbnail_url = String::new();
        assert!(!processor.process_thumbnail(&no_thumb).await.is_ok());
    }

    mockall::mock! {
        Store {}

        #[async_trait]
        impl ObjectStore for Store {
            async fn put(
                &self,
                bucket: &str,
                key: &str,
                data: Bytes,
                content_type: &str,
            ) -> gateway_traits::Result<()>;

            fn public_url(&self, bucket: &str, key: &str) -> String;

            async fn delete(&self, bucket: &str, key: &str) -> gateway_traits::Result<bool>;
        }
    }

    #[tokio::test]
    async fn thumbnail_upload_retries_transient_store_failures() {
        let mut store = MockStore::new();
        let mut failures_left = 1;
        store
            .expect_put()
            .times(2)
            .returning(move |_, _, _, _| {
                if failures_left > 0 {
                    failures_left -= 1;
                    Err(gateway_traits::GatewayError::OperationFailed(
                        "store hiccup".to_string(),
                    ))
                } else {
                    Ok(())
                }
            });
        store
            .expect_public_url()
            .returning(|bucket, key| format!("https://store.example/{bucket}/{key}"));

        let mut config = thumb_config();
        config.retry = RetryPolicy::immediate(1);
        let processor = ThumbnailProcessor::new(
            Arc::new(FixedHttp {
                status: 200,
                body: b"jpeg-bytes",
            }),
            Arc::new(store),
            "thumbnails",
            config,
        );

        let outcome = processor.process_thumbnail(&video()).await;
        assert!(outcome.is_ok(), "retry did not recover: {outcome:?}");
    }

    #[tokio::test]
    async fn audio_processor_digests_and_stores() {
        let store = Arc::new(MemoryStore {
            objects: Mutex::new(vec![]),
        });
        let downloader = Arc::new(AudioDownloadService::new(
            Arc::new(OneFileBackend),
            AudioConfig {
                retry: RetryPolicy::immediate(0),
                ..AudioConfig::default()
            },
        ));
        let processor = AudioProcessor::new(
            downloader,
            store.clone(),
            "audio",
            RetryPolicy::immediate(0),
        );

        let stored = processor.process_audio(&video()).await.ok().unwrap();

        assert!(stored.key.starts_with("vid42-"));
        assert!(stored.key.ends_with(".m4a"));
        assert_eq!(stored.sha256_hex.len(), 64);
        assert_eq!(&stored.data[..], b"audio-bytes");
        assert_eq!(store.objects.lock().unwrap().len(), 1);
    }
}
