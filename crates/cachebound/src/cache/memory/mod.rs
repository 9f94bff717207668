//! In-memory cache backend implementation.
//!
//! Provides a thread-safe in-memory cache with absolute and sliding
//! expiration for single-instance deployments.

mod cache;

pub use cache::MemoryCache;
