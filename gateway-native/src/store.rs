//! Object storage over a Supabase-storage-style REST surface.
//!
//! Endpoints used:
//!
//! - `POST {endpoint}/object/{bucket}/{key}` — upload (upsert)
//! - `GET  {endpoint}/object/public/{bucket}/{key}` — public read
//! - `DELETE {endpoint}/object/{bucket}/{key}` — delete

use async_trait::async_trait;
use bytes::Bytes;
use gateway_traits::{
    error::Result,
    http::{HttpClient, HttpMethod, HttpRequest},
    store::ObjectStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub struct BucketStore {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    api_key: String,
}

impl BucketStore {
    /// `endpoint` is the storage base, e.g. `https://xyz.supabase.co/storage/v1`.
    pub fn new(http: Arc<dyn HttpClient>, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self {
            http,
            endpoint,
            api_key: api_key.into(),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.endpoint,
            urlencoding::encode(bucket),
            encode_key(key)
        )
    }
}

/// Keys may contain `/` separators that must survive encoding.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl ObjectStore for BucketStore {
    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()> {
        let size = data.len();
        let request = HttpRequest::new(HttpMethod::Post, self.object_url(bucket, key))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .timeout(UPLOAD_TIMEOUT);

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        debug!(bucket, key, size, "object stored");
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.endpoint,
            urlencoding::encode(bucket),
            encode_key(key)
        )
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<bool> {
        let request = HttpRequest::new(HttpMethod::Delete, self.object_url(bucket, key))
            .header("Authorization", format!("Bearer {}", self.api_key));

        let response = self.http.execute(request).await?;
        match response.status {
            200 | 204 => Ok(true),
            404 => Ok(false),
            _ => Err(response.into_error()),
        }
    }
}
