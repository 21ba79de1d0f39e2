//! Trait seams for ritmo's external collaborators.
//!
//! The ingestion core never talks to the outside world directly. Every
//! remote dependency — the HTTP layer, the binary object store, the audio
//! extraction backend — sits behind a trait defined here, so production
//! gateways (`gateway-native`) and test doubles are interchangeable at the
//! composition root.

pub mod audio;
pub mod error;
pub mod http;
pub mod store;

pub use audio::{AudioBackend, AudioProbe, FormatPreferences};
pub use error::{GatewayError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use store::ObjectStore;
