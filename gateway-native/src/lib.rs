//! Production gateway implementations.
//!
//! - [`ReqwestHttpClient`] — pooled HTTP over `reqwest`.
//! - [`BucketStore`] — object storage speaking a Supabase-storage-style
//!   REST surface, built on the same [`gateway_traits::HttpClient`] seam.
//! - [`YtDlpBackend`] — audio extraction via the `yt-dlp` subprocess.

pub mod http;
pub mod store;
pub mod ytdlp;

pub use http::ReqwestHttpClient;
pub use store::BucketStore;
pub use ytdlp::YtDlpBackend;
