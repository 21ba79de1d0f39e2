//! YouTube search adapter.
//!
//! Wraps the YouTube Data API v3 behind [`VideoSearchService`]: query → id
//! resolution → batched detail hydration → [`core_extract::VideoInfo`].
//! Every metered call is guarded three ways, outermost first: a fail-closed
//! daily quota pre-check, a bounded retry loop, and a circuit breaker that
//! makes sustained failure runs fail fast.

pub mod duration;
pub mod error;
pub mod quota;
pub mod service;
mod wire;

pub use error::{Result, SearchError};
pub use quota::QuotaLedger;
pub use service::{MusicCategory, SearchOrder, SearchOptions, VideoSearchService};
