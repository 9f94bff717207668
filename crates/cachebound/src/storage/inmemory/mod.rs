//! In-memory storage backend.
//!
//! Rows live in per-table `BTreeMap`s behind an `Arc<RwLock<_>>`. Data is
//! not persisted and is lost when the last handle is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use cachebound::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! // Hand it to a RepositoryWrapperFactory...
//! ```

mod constraints;
mod store;

pub use store::InMemoryStore;
