//! Redis cache implementation.
//!
//! Each entry is a hash `{data, absexp, sldexp}` whose key carries a
//! `PEXPIRE` equal to the time left before the earliest expiration window.
//! A hit re-arms the expiry so the sliding window restarts, capped at the
//! absolute deadline.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;

use cachebound_core::cache::{Cache, CacheEntryOptions, Result};

use super::error::map_redis_error;
use super::metadata::{self, ABSOLUTE_FIELD, DATA_FIELD, SLIDING_FIELD};

/// Redis cache backend using connection manager for pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();

        let (data, absolute, sliding): (Option<Vec<u8>>, Option<i64>, Option<i64>) =
            redis::cmd("HMGET")
                .arg(key)
                .arg(DATA_FIELD)
                .arg(ABSOLUTE_FIELD)
                .arg(SLIDING_FIELD)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;

        let Some(data) = data else {
            return Ok(None);
        };

        let options = metadata::decode(absolute.unwrap_or(-1), sliding.unwrap_or(-1));
        match metadata::expire_millis(&options, Utc::now()) {
            Some(0) => {
                conn.del::<_, ()>(key).await.map_err(map_redis_error)?;
                Ok(None)
            }
            Some(ms) => {
                conn.pexpire::<_, ()>(key, ms)
                    .await
                    .map_err(map_redis_error)?;
                Ok(Some(data))
            }
            None => Ok(Some(data)),
        }
    }

    async fn set(&self, key: &str, value: &[u8], options: &CacheEntryOptions) -> Result<()> {
        let mut conn = self.conn.clone();
        let (absolute, sliding) = metadata::encode(options);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(key)
            .ignore()
            .cmd("HSET")
            .arg(key)
            .arg(DATA_FIELD)
            .arg(value)
            .arg(ABSOLUTE_FIELD)
            .arg(absolute)
            .arg(SLIDING_FIELD)
            .arg(sliding)
            .ignore();

        if let Some(ms) = metadata::expire_millis(options, Utc::now()) {
            // PEXPIRE 0 deletes the key right away
            pipe.pexpire(key, ms).ignore();
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)?;
        Ok(())
    }
}
