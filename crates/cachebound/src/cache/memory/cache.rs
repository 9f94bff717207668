//! In-memory cache implementation with LRU eviction.
//!
//! Entries honour both expiration windows of [`CacheEntryOptions`]: a read
//! restarts the sliding window but never extends past the absolute deadline.
//! Expired entries are dropped lazily when they are next read.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::RwLock;

use cachebound_core::cache::{Cache, CacheEntryOptions, Result};

/// A single cache entry with its expiration options.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    options: CacheEntryOptions,
    last_access: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, options: CacheEntryOptions, now: DateTime<Utc>) -> Self {
        Self {
            value,
            options,
            last_access: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.options.is_expired(self.last_access, now)
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
/// Uses LRU eviction to limit memory usage when `max_entries` is reached.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache holding at most `max_entries` keys.
    pub fn new(max_entries: NonZeroUsize) -> Self {
        Self {
            store: Arc::new(RwLock::new(LruCache::new(max_entries))),
        }
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let expired = match store.get_mut(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_access = now;
                return Ok(Some(entry.value.clone()));
            }
            None => false,
        };

        if expired {
            store.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], options: &CacheEntryOptions) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(
            key.to_string(),
            CacheEntry::new(value.to_vec(), *options, Utc::now()),
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::time::Duration;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn test_cache() -> MemoryCache {
        MemoryCache::new(capacity(1000))
    }

    fn no_expiration() -> CacheEntryOptions {
        CacheEntryOptions::new()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = test_cache();

        cache.set("test:key", b"value", &no_expiration()).await.unwrap();
        let result = cache.get("test:key").await.unwrap();

        assert_eq!(result, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = test_cache();
        assert_eq!(cache.get("nonexistent:key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = test_cache();

        cache.set("test:remove", b"gone", &no_expiration()).await.unwrap();
        cache.remove("test:remove").await.unwrap();

        assert!(cache.get("test:remove").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let cache = test_cache();
        assert!(cache.remove("never:set").await.is_ok());
    }

    #[tokio::test]
    async fn test_absolute_expiration_in_past_is_a_miss() {
        let cache = test_cache();
        let options =
            CacheEntryOptions::new().with_absolute_expiration(Utc::now() - TimeDelta::seconds(1));

        cache.set("test:past", b"stale", &options).await.unwrap();

        assert!(cache.get("test:past").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_absolute_expiration_elapses() {
        let cache = test_cache();
        let options = CacheEntryOptions::new()
            .with_absolute_expiration(Utc::now() + TimeDelta::milliseconds(50));

        cache.set("test:abs", b"short-lived", &options).await.unwrap();
        assert!(cache.get("test:abs").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("test:abs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sliding_expiration_refreshed_by_reads() {
        let cache = test_cache();
        let options = CacheEntryOptions::new().with_sliding_expiration(Duration::from_millis(150));

        cache.set("test:slide", b"kept warm", &options).await.unwrap();

        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(cache.get("test:slide").await.unwrap().is_some());
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(cache.get("test:slide").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sliding_never_extends_past_absolute() {
        let cache = test_cache();
        let options = CacheEntryOptions::new()
            .with_absolute_expiration(Utc::now() + TimeDelta::milliseconds(120))
            .with_sliding_expiration(Duration::from_secs(60));

        cache.set("test:both", b"value", &options).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("test:both").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get("test:both").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_options() {
        let cache = test_cache();
        let expired =
            CacheEntryOptions::new().with_absolute_expiration(Utc::now() - TimeDelta::seconds(1));

        cache.set("test:overwrite", b"first", &expired).await.unwrap();
        cache
            .set("test:overwrite", b"second", &no_expiration())
            .await
            .unwrap();

        let result = cache.get("test:overwrite").await.unwrap();
        assert_eq!(result, Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(capacity(3));
        let options = no_expiration();

        cache.set("key1", b"value1", &options).await.unwrap();
        cache.set("key2", b"value2", &options).await.unwrap();
        cache.set("key3", b"value3", &options).await.unwrap();

        // Touch key1 so key2 becomes least recently used
        cache.get("key1").await.unwrap();

        cache.set("key4", b"value4", &options).await.unwrap();

        assert!(cache.get("key1").await.unwrap().is_some());
        assert!(cache.get("key2").await.unwrap().is_none());
        assert!(cache.get("key3").await.unwrap().is_some());
        assert!(cache.get("key4").await.unwrap().is_some());
    }
}
