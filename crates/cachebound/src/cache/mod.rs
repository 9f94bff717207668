//! Cache backend implementations.
//!
//! This module provides concrete implementations of the [`Cache`] trait
//! defined in `cachebound_core::cache`.
//!
//! # Feature Flags
//!
//! - `memory` (default): selects the in-process LRU cache in the binary
//! - `redis`: compiles the Redis cache, for deployments with several instances
//!
//! The in-process cache is always compiled so tests and embedders can use it
//! regardless of the selected features.
//!
//! [`Cache`]: cachebound_core::cache::Cache

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;

mod invalidation;

pub use invalidation::invalidate_touched;
