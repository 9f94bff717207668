//! Cache-backed generic repositories with a unit-of-work wrapper.
//!
//! Reads go through a whole-table snapshot kept in a [`Cache`]; writes are
//! staged per unit of work and committed atomically to a [`Store`].
//!
//! # Feature Flags
//!
//! - `inmemory` (default) / `sqlite`: storage backend used by the binary
//! - `memory` (default) / `redis`: cache backend used by the binary
//!
//! [`Cache`]: cachebound_core::cache::Cache
//! [`Store`]: cachebound_core::storage::Store

pub mod blocking;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod context;
pub mod identity;
pub mod repository;
pub mod storage;
pub mod wrapper;

pub use blocking::{BlockingRepository, BlockingRepositoryWrapper};
pub use config::{Config, ConfigError};
pub use identity::StoreUserManager;
pub use repository::{AuthRepository, Query, Repository, RoleRepository, UserRoleRepository};
pub use wrapper::{RepositoryWrapper, RepositoryWrapperFactory};
