//! Pure functions for converting entity snapshots to and from cache bytes.
//!
//! Snapshots are stored as a JSON array so cached values stay readable with
//! `redis-cli` or any other inspection tool.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serializes a full entity snapshot to JSON bytes.
pub fn serialize_snapshot<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec(items).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes back to an entity snapshot.
pub fn deserialize_snapshot<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ConcurrencyToken, Role};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn persisted_role(id: i64, name: &str) -> Role {
        let mut role = Role::new(name, "system");
        role.audit.id = Some(id);
        role.audit.external_id = Some(Uuid::new_v4());
        role.audit.created_at_utc = Some(Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap());
        role.audit.concurrency_token = Some(ConcurrencyToken::generate());
        role
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_audit() {
        let roles = vec![persisted_role(1, "Admin"), persisted_role(2, "Editor")];

        let bytes = serialize_snapshot(&roles).unwrap();
        let back: Vec<Role> = deserialize_snapshot(&bytes).unwrap();

        assert_eq!(back, roles);
    }

    #[test]
    fn test_empty_snapshot_is_json_array() {
        let bytes = serialize_snapshot::<Role>(&[]).unwrap();
        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn test_deserialize_invalid_json_fails() {
        let result = deserialize_snapshot::<Role>(b"not json");
        assert!(matches!(
            result,
            Err(SerializationError::DeserializeFailed(_))
        ));
    }

    #[test]
    fn test_deserialize_wrong_shape_fails() {
        let result = deserialize_snapshot::<Role>(br#"{"name":"Admin"}"#);
        assert!(result.is_err());
    }
}
