//! HTTP client abstraction.
//!
//! A minimal request/response model so provider adapters can be tested
//! against canned responses without a network. Retry and circuit breaking
//! deliberately live one level up (`core-resilience`), not in the client.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{GatewayError, Result};

/// HTTP method types used by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// HTTP request builder.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a urlencoded query pair to the request URL.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(sep);
        self.url.push_str(&urlencoding::encode(key));
        self.url.push('=');
        self.url.push_str(&urlencoding::encode(value));
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| GatewayError::OperationFailed(format!("JSON deserialization failed: {e}")))
    }

    /// Response body as a UTF-8 string, lossy on invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Parsed `Retry-After` header, if the server sent one.
    pub fn retry_after(&self) -> Option<u64> {
        self.headers
            .get("Retry-After")
            .and_then(|v| v.parse::<u64>().ok())
    }

    /// Promote a non-2xx response into the matching [`GatewayError`].
    pub fn into_error(self) -> GatewayError {
        if self.status == 429 {
            GatewayError::RateLimited {
                retry_after_seconds: self.retry_after().unwrap_or(60),
            }
        } else {
            GatewayError::Http {
                status: self.status,
                body: self.text(),
            }
        }
    }
}

/// Async HTTP client seam.
///
/// Implementations own connection pooling, TLS, and per-request timeouts.
/// They must not retry internally; callers compose retry and breaker
/// behavior explicitly.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a single HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection fails, TLS validation fails, or
    /// the request times out. A response with a non-2xx status is NOT an
    /// error at this layer; callers inspect the status themselves.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}
