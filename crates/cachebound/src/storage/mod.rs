//! Storage backend implementations.
//!
//! This module provides concrete implementations of the [`Store`] trait
//! defined in `cachebound_core::storage`.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): selects the in-process store in the binary
//! - `sqlite`: compiles the SQLite store using `rusqlite` and `tokio-rusqlite`
//!
//! The in-process store is always compiled; it backs the test suites.
//!
//! [`Store`]: cachebound_core::storage::Store

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
