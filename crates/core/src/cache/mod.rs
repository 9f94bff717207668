mod error;
mod keys;
mod options;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{snapshot_key, snapshot_key_for, SNAPSHOT_PREFIX};
pub use options::{
    CacheEntryOptions, CachePolicy, ExpirationSettings, InvalidationPolicy,
    ParseInvalidationPolicyError,
};
pub use serialization::{deserialize_snapshot, serialize_snapshot, SerializationError};
pub use traits::Cache;
