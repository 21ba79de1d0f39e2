use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing required setting: {0}")]
    MissingSetting(String),

    #[error("logging initialization failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
