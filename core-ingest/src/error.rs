use core_resilience::FailureKind;
use gateway_traits::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("no audio file with an allowed extension was produced")]
    NoAudioFile,

    #[error("not a fetchable URL: {0}")]
    InvalidUrl(String),

    #[error("worker task failed: {0}")]
    TaskJoin(String),

    #[error("operation exceeded the {seconds}s timeout")]
    Timeout { seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Retry classification for the surrounding [`core_resilience::Retrier`].
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Gateway(GatewayError::Unavailable(_)) => FailureKind::NotFound,
            Self::Gateway(err) if err.is_transient() => FailureKind::Transient,
            Self::Gateway(_) => FailureKind::Rejected,
            Self::TooLarge { .. } | Self::NoAudioFile | Self::InvalidUrl(_) => {
                FailureKind::Rejected
            }
            Self::TaskJoin(_) | Self::Timeout { .. } | Self::Io(_) => FailureKind::Transient,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
