//! Runtime layer for the ritmo ingestion core.
//!
//! Owns the two concerns every other crate assumes are already in place:
//! typed, validated configuration ([`config::RitmoConfig`]) and `tracing`
//! subscriber setup ([`logging::init_logging`]). Nothing here touches the
//! network or the filesystem beyond reading environment variables.

pub mod config;
pub mod error;
pub mod logging;

pub use config::RitmoConfig;
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, LogFormat, LoggingConfig};
