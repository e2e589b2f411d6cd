use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// The fast cache in front of the durable store.
///
/// Values are the original URL strings, keyed by [`ShortCode`]. Every entry
/// carries a TTL; implementations reject a zero TTL instead of writing an
/// entry that would never expire or expire immediately.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the cached URL.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store the URL with the given time-to-live.
    async fn set_url(&self, code: &ShortCode, url: &str, ttl: Duration) -> Result<()>;

    /// Remove the cached URL.
    ///
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> Result<()>;
}

/// A shared, append-only bit array.
///
/// Both operations touch many bits at once and must do so in a single round
/// trip to the backing store.
#[async_trait]
pub trait BitStore: Send + Sync + 'static {
    /// Sets every bit at the given offsets.
    async fn set_bits(&self, offsets: &[u64]) -> Result<()>;

    /// Reads the bits at the given offsets, in order.
    async fn get_bits(&self, offsets: &[u64]) -> Result<Vec<bool>>;
}

/// Lets several consumers in one process share a single bit array.
#[async_trait]
impl<T: BitStore + ?Sized> BitStore for Arc<T> {
    async fn set_bits(&self, offsets: &[u64]) -> Result<()> {
        (**self).set_bits(offsets).await
    }

    async fn get_bits(&self, offsets: &[u64]) -> Result<Vec<bool>> {
        (**self).get_bits(offsets).await
    }
}
