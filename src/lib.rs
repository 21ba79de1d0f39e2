//! Workspace facade crate.
//!
//! Depending on `ritmo` pulls in the composition root (`core-service`) and
//! the runtime configuration layer (`core-runtime`), which together expose
//! everything a host application needs to run the ingestion core. The
//! individual `core-*` crates remain available for hosts that want to wire
//! a custom composition.

pub use core_runtime::config::RitmoConfig;
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_service::{IngestReport, IngestUseCase, ServiceBuilder, Services};
