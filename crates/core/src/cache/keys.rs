use crate::entity::Entity;

/// Prefix shared by every entity snapshot key.
pub const SNAPSHOT_PREFIX: &str = "snapshot:";

/// Returns the cache key holding the full snapshot of an entity type.
///
/// The key is built from the fully-qualified type name, so two entity types
/// with the same bare name in different modules never share a snapshot.
pub fn snapshot_key<T: Entity>() -> String {
    snapshot_key_for(T::type_name())
}

/// Returns the snapshot key for an already-resolved type name.
pub fn snapshot_key_for(type_name: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{type_name}")
}
