//! Composition root.

use core_catalog::{
    SqliteAlbumRepository, SqliteArtistRepository, SqliteTrackRepository,
};
use core_extract::MetadataExtractor;
use core_ingest::{
    AudioDownloadService, AudioProcessor, IngestPipeline, MusicService, ProcessorRegistry,
    ThumbnailProcessor,
};
use core_runtime::RitmoConfig;
use gateway_native::{BucketStore, ReqwestHttpClient, YtDlpBackend};
use gateway_traits::{AudioBackend, HttpClient, ObjectStore};
use provider_youtube::VideoSearchService;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::use_case::IngestUseCase;

/// Everything a host needs to run the ingestion core.
pub struct Services {
    pub music: Arc<MusicService>,
    pub search: Arc<VideoSearchService>,
    pub ingest: IngestUseCase,
}

/// Builds the object graph from configuration.
///
/// Gateways default to their production implementations; tests and embedded
/// hosts may override any of them before calling [`ServiceBuilder::build`].
pub struct ServiceBuilder {
    config: RitmoConfig,
    http: Option<Arc<dyn HttpClient>>,
    store: Option<Arc<dyn ObjectStore>>,
    audio_backend: Option<Arc<dyn AudioBackend>>,
}

impl ServiceBuilder {
    pub fn new(config: RitmoConfig) -> Self {
        Self {
            config,
            http: None,
            store: None,
            audio_backend: None,
        }
    }

    pub fn http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn audio_backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.audio_backend = Some(backend);
        self
    }

    /// Construct the full object graph.
    ///
    /// # Errors
    ///
    /// Construction-time problems are fatal and propagate: invalid
    /// configuration, no downloader binary on PATH, unreachable catalog.
    pub async fn build(self) -> Result<Services> {
        let config = self.config;
        config.validate()?;

        let http: Arc<dyn HttpClient> = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let store: Arc<dyn ObjectStore> = self.store.unwrap_or_else(|| {
            Arc::new(BucketStore::new(
                Arc::clone(&http),
                config.storage.endpoint.clone(),
                config.storage.api_key.clone(),
            ))
        });
        let audio_backend: Arc<dyn AudioBackend> = match self.audio_backend {
            Some(backend) => backend,
            None => Arc::new(YtDlpBackend::new(config.audio.download_timeout())?),
        };

        let extractor = Arc::new(MetadataExtractor::new());
        let search = Arc::new(VideoSearchService::new(
            config.search.clone(),
            Arc::clone(&http),
            Arc::clone(&extractor),
        )?);

        let downloader = Arc::new(AudioDownloadService::new(
            audio_backend,
            config.audio.clone(),
        ));
        let thumbnails = Arc::new(ThumbnailProcessor::new(
            Arc::clone(&http),
            Arc::clone(&store),
            config.storage.thumbnail_bucket.clone(),
            config.thumbnail.clone(),
        ));
        let audio = Arc::new(AudioProcessor::new(
            downloader,
            Arc::clone(&store),
            config.storage.audio_bucket.clone(),
            config.audio.retry.clone(),
        ));
        let registry = Arc::new(ProcessorRegistry::standard(&config.pipeline));
        let pipeline = Arc::new(IngestPipeline::new(
            thumbnails,
            audio,
            registry,
            &config.pipeline,
        ));

        let music = Arc::new(MusicService::new(Arc::clone(&search), pipeline));

        let pool = core_catalog::connect(&config.catalog.database_url).await?;
        let ingest = IngestUseCase::new(
            Arc::clone(&music),
            Arc::new(SqliteTrackRepository::new(pool.clone())),
            Arc::new(SqliteArtistRepository::new(pool.clone())),
            Arc::new(SqliteAlbumRepository::new(pool)),
        );

        info!("service graph constructed");
        Ok(Services {
            music,
            search,
            ingest,
        })
    }
}
