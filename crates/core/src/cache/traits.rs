use async_trait::async_trait;

use super::{CacheEntryOptions, Result};

/// Distributed key/value cache client.
///
/// Values are opaque bytes. An entry is evicted when either its absolute or
/// its sliding expiration elapses, whichever comes first.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key. A hit refreshes the sliding window.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache, replacing any previous entry and its options.
    async fn set(&self, key: &str, value: &[u8], options: &CacheEntryOptions) -> Result<()>;

    /// Removes a value from the cache. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
