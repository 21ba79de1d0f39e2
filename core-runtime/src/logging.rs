//! Logging and tracing setup.
//!
//! Thin wrapper over `tracing-subscriber`: pick a format, pick a filter,
//! initialize once. The `RITMO_LOG` environment variable overrides the
//! configured filter with standard `EnvFilter` syntax.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, RuntimeError};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output with colors; the default for debug builds.
    Pretty,
    /// Structured JSON for machine ingestion; the default for release builds.
    Json,
    /// Single-line compact output.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter directive when `RITMO_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "info".to_string(),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error (instead of panicking) when a global subscriber is
/// already installed — tests and embedding hosts may have their own.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env("RITMO_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.filter.clone()));

    let result = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init(),
        LogFormat::Json => fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Compact => fmt().with_env_filter(filter).compact().try_init(),
    };

    result.map_err(|e| RuntimeError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_error_not_panic() {
        let first = init_logging(LoggingConfig::default());
        let second = init_logging(LoggingConfig::default());
        // Exactly one of the two may win depending on test ordering across
        // the process; the second must fail cleanly either way.
        if first.is_ok() {
            assert!(matches!(second, Err(RuntimeError::Logging(_))));
        }
    }
}
