use gateway_traits::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("quota ceiling would be exceeded (used {used} of {limit}, call costs {cost})")]
    QuotaExceeded { used: u64, limit: u64, cost: u64 },

    #[error("provider API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("unparseable provider response: {0}")]
    Parse(String),

    #[error("invalid search configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SearchError {
    /// Whether the error should feed circuit-breaker failure accounting.
    ///
    /// Rate/quota responses (429/403) and transient network trouble count;
    /// local parse problems and the fail-closed quota pre-check do not.
    pub fn counts_toward_breaker(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status == 403 || *status >= 500,
            Self::Gateway(err) => {
                err.is_transient() || matches!(err, GatewayError::Http { status: 403, .. })
            }
            _ => false,
        }
    }

    /// Whether a retry attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Gateway(err) => err.is_transient(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
