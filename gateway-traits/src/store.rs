//! Binary object store abstraction.
//!
//! Audio payloads and thumbnails land in distinct logical buckets. Keys are
//! caller-chosen; implementations only promise that `public_url` resolves a
//! key previously accepted by `put`.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a binary object under `bucket`/`key`, overwriting any previous
    /// object at the same key.
    async fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Publicly reachable URL for a stored object.
    ///
    /// Pure derivation from configuration; does not verify the object exists.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Delete an object.
    ///
    /// # Returns
    /// `Ok(true)` if the object was deleted, `Ok(false)` if it did not exist.
    async fn delete(&self, bucket: &str, key: &str) -> Result<bool>;
}
