//! Redis cache backend implementation.
//!
//! Provides a distributed cache using Redis for multi-instance deployments.
//! Entries are Redis hashes carrying the value and its expiration metadata,
//! so every instance applies the same absolute and sliding windows.

mod cache;
mod error;
mod metadata;

pub use cache::RedisCache;
