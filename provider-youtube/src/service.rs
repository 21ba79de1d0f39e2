//! The YouTube search adapter.

use core_extract::{EnrichedVideo, MetadataExtractor, VideoInfo};
use core_resilience::{BreakerError, CircuitBreaker, FailureKind, Outcome, Retrier, SkipReason};
use core_runtime::config::SearchConfig;
use gateway_traits::{HttpClient, HttpRequest, HttpResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::duration::parse_iso8601_duration;
use crate::error::{Result, SearchError};
use crate::quota::QuotaLedger;
use crate::wire::{ApiErrorResponse, SearchResponse, VideoItem, VideosResponse};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Detail hydration is batched; the API caps one call at 50 ids.
const MAX_IDS_PER_CALL: usize = 50;

/// Thumbnail variants in preference order.
const THUMBNAIL_PREFERENCE: &[&str] = &["maxres", "high", "medium", "default"];

/// Provider categories the ingestion core cares about.
const CATEGORY_TABLE: &[(&str, &str)] = &[("10", "Music"), ("24", "Entertainment")];

/// Result ordering accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    #[default]
    Relevance,
    Date,
    Rating,
    ViewCount,
}

impl SearchOrder {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Date => "date",
            Self::Rating => "rating",
            Self::ViewCount => "viewCount",
        }
    }
}

/// Per-call search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Page size override; the configured default when `None`.
    pub max_results: Option<u32>,
    pub order: SearchOrder,
    /// Restrict results to one provider category (e.g. `10` for Music).
    pub category_hint: Option<String>,
    /// Run the metadata extractor over each built video.
    pub enrich_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicCategory {
    pub id: String,
    pub name: String,
}

/// Breaker and quota share one lock: both are consulted per attempt and the
/// pair must be observed atomically by concurrent callers.
struct CallGuard {
    quota: QuotaLedger,
    breaker: CircuitBreaker,
}

/// Search adapter over the provider HTTP API.
///
/// All public batch operations follow the fail-soft contract: expected
/// failures (quota exhausted, breaker open, retries exhausted, nothing
/// found) produce empty results, never errors.
pub struct VideoSearchService {
    config: SearchConfig,
    http: Arc<dyn HttpClient>,
    extractor: Arc<MetadataExtractor>,
    retrier: Retrier,
    guard: Mutex<CallGuard>,
}

impl VideoSearchService {
    /// # Errors
    ///
    /// Configuration problems are construction-time fatal, per the error
    /// design: an empty API key fails here, not on the first search.
    pub fn new(
        config: SearchConfig,
        http: Arc<dyn HttpClient>,
        extractor: Arc<MetadataExtractor>,
    ) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(SearchError::Config("api_key must not be empty".to_string()));
        }
        if config.random_query_seeds.is_empty() {
            return Err(SearchError::Config(
                "random_query_seeds must not be empty".to_string(),
            ));
        }
        let retrier = Retrier::new(config.retry.clone());
        let guard = Mutex::new(CallGuard {
            quota: QuotaLedger::new(config.quota_limit_per_day),
            breaker: CircuitBreaker::new(&config.breaker),
        });
        Ok(Self {
            config,
            http,
            extractor,
            retrier,
            guard,
        })
    }

    /// Search for videos and hydrate their details.
    pub async fn search_videos(&self, query: &str, options: &SearchOptions) -> Vec<EnrichedVideo> {
        let ids = match self.resolve_ids(query, options).await {
            Outcome::Ok(ids) => ids,
            Outcome::Skipped(reason) => {
                debug!(query, %reason, "id resolution produced nothing");
                return Vec::new();
            }
        };
        if ids.is_empty() {
            return Vec::new();
        }

        let infos = self.hydrate(&ids).await;
        info!(query, found = infos.len(), "search complete");
        self.finish(infos, options.enrich_metadata)
    }

    /// Fetch one video by id.
    pub async fn get_video_details(&self, video_id: &str) -> Outcome<EnrichedVideo> {
        let ids = [video_id.to_string()];
        let mut infos = self.hydrate(&ids).await;
        match infos.pop() {
            Some(info) => Outcome::Ok(self.enrich(info)),
            None => Outcome::Skipped(SkipReason::NotFound),
        }
    }

    /// Search using a uniformly chosen seed query.
    ///
    /// The choice goes through the OS random source rather than a seeded
    /// PRNG, sidestepping the predictable-sequence footgun even though no
    /// security property rides on it.
    pub async fn get_random_videos(&self, options: &SearchOptions) -> Vec<EnrichedVideo> {
        let seeds = &self.config.random_query_seeds;
        let query = seeds[secure_index(seeds.len())].as_str();
        debug!(query, "random seed query chosen");
        self.search_videos(query, options).await
    }

    /// Provider categories relevant to music ingestion.
    pub fn music_categories(&self) -> Vec<MusicCategory> {
        CATEGORY_TABLE
            .iter()
            .map(|(id, name)| MusicCategory {
                id: (*id).to_string(),
                name: (*name).to_string(),
            })
            .collect()
    }

    /// Quota units spent today, for observability.
    pub async fn quota_used_today(&self) -> u64 {
        self.guard.lock().await.quota.used_today()
    }

    async fn resolve_ids(&self, query: &str, options: &SearchOptions) -> Outcome<Vec<String>> {
        let max_results = options.max_results.unwrap_or(self.config.max_results);
        let request = {
            let mut request = HttpRequest::get(format!("{API_BASE}/search"))
                .query("part", "id")
                .query("type", "video")
                .query("q", query)
                .query("maxResults", &max_results.to_string())
                .query("order", options.order.as_str());
            if let Some(category) = &options.category_hint {
                request = request.query("videoCategoryId", category);
            }
            request
        };

        let response = match self
            .metered_get("search", self.config.search_cost, &request)
            .await
        {
            Outcome::Ok(response) => response,
            Outcome::Skipped(reason) => return Outcome::Skipped(reason),
        };

        match response.json::<SearchResponse>() {
            Ok(parsed) => Outcome::Ok(
                parsed
                    .items
                    .into_iter()
                    .filter_map(|item| item.id.video_id)
                    .collect(),
            ),
            Err(err) => {
                warn!(error = %err, "search response did not parse");
                Outcome::rejected("unparseable search response")
            }
        }
    }

    /// Batched detail hydration; per-chunk failures drop that chunk only.
    async fn hydrate(&self, ids: &[String]) -> Vec<VideoInfo> {
        let mut infos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_CALL) {
            let request = HttpRequest::get(format!("{API_BASE}/videos"))
                .query("part", "snippet,statistics,contentDetails")
                .query("id", &chunk.join(","));

            let response = match self
                .metered_get("videos", self.config.videos_cost, &request)
                .await
            {
                Outcome::Ok(response) => response,
                Outcome::Skipped(reason) => {
                    debug!(%reason, chunk = chunk.len(), "hydration chunk skipped");
                    continue;
                }
            };

            match response.json::<VideosResponse>() {
                Ok(parsed) => {
                    infos.extend(parsed.items.into_iter().filter_map(build_video_info));
                }
                Err(err) => warn!(error = %err, "videos response did not parse"),
            }
        }
        infos
    }

    fn finish(&self, infos: Vec<VideoInfo>, enrich: bool) -> Vec<EnrichedVideo> {
        infos
            .into_iter()
            .map(|info| {
                if enrich {
                    self.enrich(info)
                } else {
                    EnrichedVideo::bare(info)
                }
            })
            .collect()
    }

    fn enrich(&self, info: VideoInfo) -> EnrichedVideo {
        let metadata = self.extractor.extract(&info);
        EnrichedVideo { info, metadata }
    }

    /// One metered API call: quota pre-check, retry outside breaker.
    ///
    /// Retry wraps the breaker, so every attempt feeds breaker accounting;
    /// once the breaker opens, remaining attempts fail fast instead of
    /// waiting out their backoff.
    async fn metered_get(
        &self,
        label: &str,
        cost: u64,
        request: &HttpRequest,
    ) -> Outcome<HttpResponse> {
        self.retrier
            .run(label, classify, || async {
                let mut guard = self.guard.lock().await;
                let CallGuard { quota, breaker } = &mut *guard;
                let result = breaker
                    .call(SearchError::counts_toward_breaker, || async {
                        if !quota.try_reserve(cost) {
                            return Err(SearchError::QuotaExceeded {
                                used: quota.used_today(),
                                limit: self.config.quota_limit_per_day,
                                cost,
                            });
                        }
                        let authorized = request
                            .clone()
                            .query("key", &self.config.api_key)
                            .header("Accept", "application/json")
                            .header("X-Goog-Api-Client", self.config.application_name.clone())
                            .timeout(REQUEST_TIMEOUT);
                        let response = self.http.execute(authorized).await?;
                        if response.is_success() {
                            Ok(response)
                        } else {
                            Err(api_error(response))
                        }
                    })
                    .await;
                match result {
                    Ok(response) => Ok(response),
                    Err(BreakerError::Open) => Err(SearchError::CircuitOpen),
                    Err(BreakerError::Inner(err)) => Err(err),
                }
            })
            .await
    }
}

/// Map adapter errors onto retry behavior.
fn classify(err: &SearchError) -> FailureKind {
    match err {
        // The fail-closed quota check and an open breaker both mean "stop
        // now"; backing off would just burn time.
        SearchError::QuotaExceeded { .. } | SearchError::CircuitOpen => FailureKind::Rejected,
        SearchError::Api { status: 404, .. } => FailureKind::NotFound,
        err if err.is_transient() => FailureKind::Transient,
        _ => FailureKind::Rejected,
    }
}

fn api_error(response: HttpResponse) -> SearchError {
    let status = response.status;
    let message = response
        .json::<ApiErrorResponse>()
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| response.text());
    SearchError::Api { status, message }
}

fn build_video_info(item: VideoItem) -> Option<VideoInfo> {
    let snippet = item.snippet?;
    let duration_seconds = item
        .content_details
        .as_ref()
        .and_then(|details| details.duration.as_deref())
        .map(parse_iso8601_duration)
        .unwrap_or(0);

    let thumbnail_url = THUMBNAIL_PREFERENCE
        .iter()
        .find_map(|variant| snippet.thumbnails.get(*variant))
        .map(|thumb| thumb.url.clone())
        .unwrap_or_default();

    let (view_count, like_count) = item
        .statistics
        .map(|stats| {
            (
                stats.view_count.and_then(|v| v.parse().ok()).unwrap_or(0),
                stats.like_count.and_then(|v| v.parse().ok()).unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));

    let genre = snippet.category_id.as_deref().and_then(|id| {
        CATEGORY_TABLE
            .iter()
            .find(|(cat_id, _)| *cat_id == id)
            .map(|(_, name)| (*name).to_string())
    });

    let published_at = snippet
        .published_at
        .as_deref()
        .and_then(|raw| raw.parse().ok());

    Some(VideoInfo {
        url: VideoInfo::watch_url(&item.id),
        video_id: item.id,
        title: snippet.title,
        channel_title: snippet.channel_title,
        channel_id: snippet.channel_id,
        thumbnail_url,
        description: snippet.description,
        duration_seconds,
        published_at,
        view_count,
        like_count,
        tags: snippet.tags,
        category_id: snippet.category_id,
        genre,
    })
}

/// Uniform index into `len` via the OS random source; index 0 on the
/// (never-observed) chance the source is unavailable.
fn secure_index(len: usize) -> usize {
    debug_assert!(len > 0);
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        warn!("OS random source unavailable, falling back to first seed");
        return 0;
    }
    (u64::from_le_bytes(buf) % len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use core_resilience::RetryPolicy;
    use gateway_traits::Result as GatewayResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CannedHttp {
        calls: AtomicU32,
        responses: fn(&HttpRequest) -> HttpResponse,
    }

    #[async_trait]
    impl HttpClient for CannedHttp {
        async fn execute(&self, request: HttpRequest) -> GatewayResult<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.responses)(&request))
        }
    }

    fn json_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn config(limit: u64) -> SearchConfig {
        SearchConfig {
            api_key: "test-key".to_string(),
            quota_limit_per_day: limit,
            retry: RetryPolicy::immediate(1),
            ..SearchConfig::default()
        }
    }

    fn service(http: Arc<CannedHttp>, limit: u64) -> VideoSearchService {
        VideoSearchService::new(config(limit), http, Arc::new(MetadataExtractor::new())).unwrap()
    }

    fn canned(request: &HttpRequest) -> HttpResponse {
        if request.url.contains("/search") {
            json_response(r#"{"items":[{"id":{"videoId":"abc123"}}]}"#)
        } else {
            json_response(
                r#"{"items":[{
                    "id":"abc123",
                    "snippet":{
                        "title":"Daft Punk - One More Time",
                        "description":"",
                        "channelTitle":"Daft PunkVEVO",
                        "channelId":"UC-dp",
                        "categoryId":"10",
                        "thumbnails":{
                            "default":{"url":"https://img/default.jpg"},
                            "maxres":{"url":"https://img/maxres.jpg"}
                        }
                    },
                    "statistics":{"viewCount":"12345","likeCount":"678"},
                    "contentDetails":{"duration":"PT3M33S"}
                }]}"#,
            )
        }
    }

    #[tokio::test]
    async fn search_builds_video_info_from_both_phases() {
        let http = Arc::new(CannedHttp {
            calls: AtomicU32::new(0),
            responses: canned,
        });
        let service = service(http.clone(), 10_000);

        let results = service
            .search_videos("daft punk", &SearchOptions::default())
            .await;

        assert_eq!(results.len(), 1);
        let info = &results[0].info;
        assert_eq!(info.video_id, "abc123");
        assert_eq!(info.duration_seconds, 213);
        assert_eq!(info.thumbnail_url, "https://img/maxres.jpg");
        assert_eq!(info.view_count, 12_345);
        assert_eq!(info.genre.as_deref(), Some("Music"));
        // Two phases, two API calls.
        assert_eq!(http.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_quota_short_circuits_without_network() {
        let http = Arc::new(CannedHttp {
            calls: AtomicU32::new(0),
            responses: canned,
        });
        // Ceiling below the search cost: every metered call is rejected.
        let service = service(http.clone(), 10);

        let results = service
            .search_videos("daft punk", &SearchOptions::default())
            .await;

        assert!(results.is_empty());
        assert_eq!(http.calls.load(Ordering::SeqCst), 0, "network was touched");
    }

    #[tokio::test]
    async fn enrichment_populates_extraction_results() {
        let http = Arc::new(CannedHttp {
            calls: AtomicU32::new(0),
            responses: canned,
        });
        let service = service(http, 10_000);

        let options = SearchOptions {
            enrich_metadata: true,
            ..SearchOptions::default()
        };
        let results = service.search_videos("daft punk", &options).await;

        let metadata = &results[0].metadata;
        assert_eq!(metadata.top_artist().unwrap().name, "Daft Punk");
    }

    #[tokio::test]
    async fn missing_video_reports_not_found() {
        let http = Arc::new(CannedHttp {
            calls: AtomicU32::new(0),
            responses: |_| json_response(r#"{"items":[]}"#),
        });
        let service = service(http, 10_000);

        let outcome = service.get_video_details("nope").await;
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NotFound));
    }
}
