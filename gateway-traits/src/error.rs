use thiserror::Error;

/// Failures surfaced by gateway implementations.
///
/// Variants are grouped by how callers are expected to react: `Timeout` and
/// `OperationFailed` are transient and worth retrying, `Unavailable` is
/// permanent for the given resource, `RateLimited` feeds circuit-breaker
/// accounting upstream.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway capability not available: {0}")]
    NotAvailable(String),

    #[error("gateway operation failed: {0}")]
    OperationFailed(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("remote content unavailable: {0}")]
    Unavailable(String),

    #[error("operation timed out")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Whether waiting and retrying could plausibly change the outcome.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::OperationFailed(_) | Self::Timeout => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
