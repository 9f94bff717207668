//! Backend wiring for the binary.

use std::sync::Arc;

use anyhow::Result;

use cachebound::config::Config;
use cachebound::wrapper::RepositoryWrapperFactory;
use cachebound_core::cache::Cache;
use cachebound_core::storage::Store;

// Storage features: exactly one must be enabled, they are mutually exclusive
#[cfg(all(feature = "sqlite", feature = "inmemory"))]
compile_error!("Cannot enable both 'sqlite' and 'inmemory' storage features");

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!("Must enable exactly one storage feature: 'inmemory' or 'sqlite'");

// Cache features: exactly one must be enabled, they are mutually exclusive
#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!("Cannot enable both 'memory' and 'redis' cache features");

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!("Must enable exactly one cache feature: 'memory' or 'redis'");

/// Builds the factory for the compiled-in backends.
pub async fn build_factory(config: &Config) -> Result<RepositoryWrapperFactory> {
    let store = build_store(config).await?;
    let cache = build_cache(config).await?;
    Ok(RepositoryWrapperFactory::new(
        store,
        cache,
        config.cache_policy(),
    ))
}

#[cfg(feature = "inmemory")]
async fn build_store(_config: &Config) -> Result<Arc<dyn Store>> {
    tracing::info!(backend = "inmemory", "Using in-memory store");
    Ok(Arc::new(cachebound::storage::InMemoryStore::new()))
}

#[cfg(feature = "sqlite")]
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    use anyhow::Context;

    tracing::info!(backend = "sqlite", path = %config.sqlite_path, "Opening SQLite store");
    let store = cachebound::storage::SqliteStore::new(&config.sqlite_path)
        .await
        .with_context(|| format!("failed to open SQLite database at {}", config.sqlite_path))?;
    Ok(Arc::new(store))
}

#[cfg(feature = "memory")]
async fn build_cache(config: &Config) -> Result<Arc<dyn Cache>> {
    tracing::info!(
        backend = "memory",
        max_entries = config.cache_max_entries.get(),
        "Using in-process cache"
    );
    Ok(Arc::new(cachebound::cache::MemoryCache::new(
        config.cache_max_entries,
    )))
}

#[cfg(feature = "redis")]
async fn build_cache(config: &Config) -> Result<Arc<dyn Cache>> {
    use anyhow::Context;

    tracing::info!(backend = "redis", url = %config.redis_url, "Connecting to Redis");
    let cache = cachebound::cache::RedisCache::new(&config.redis_url)
        .await
        .with_context(|| format!("failed to connect to Redis at {}", config.redis_url))?;
    Ok(Arc::new(cache))
}
