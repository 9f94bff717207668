//! Type-erased row representation exchanged with stores.

use serde_json::Value;

use super::{Audit, Entity, ForeignKey, Referrer, UniqueKey};

/// A single row of some entity table, with its constraint metadata.
///
/// Stores only ever see records; the typed entity is rebuilt with
/// [`Record::into_entity`]. The audit columns in `audit` are authoritative
/// over any audit values embedded in `payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub table: &'static str,
    pub type_name: &'static str,
    pub audit: Audit,
    pub payload: Value,
    pub foreign_keys: Vec<ForeignKey>,
    pub unique_keys: Vec<UniqueKey>,
    pub referenced_by: &'static [Referrer],
}

impl Record {
    /// Captures an entity as a record.
    pub fn from_entity<T: Entity>(entity: &T) -> serde_json::Result<Self> {
        Ok(Self {
            table: T::TABLE,
            type_name: T::type_name(),
            audit: entity.audit().clone(),
            payload: serde_json::to_value(entity)?,
            foreign_keys: entity.foreign_keys(),
            unique_keys: entity.unique_keys(),
            referenced_by: T::REFERENCED_BY,
        })
    }

    /// Rebuilds the typed entity, applying the record's audit columns.
    pub fn into_entity<T: Entity>(self) -> serde_json::Result<T> {
        self.into_row().into_entity()
    }

    /// Drops the constraint metadata, keeping what a store persists.
    pub fn into_row(self) -> Row {
        Row {
            audit: self.audit,
            payload: self.payload,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.audit.id
    }

    /// Reads a top-level payload field as an integer.
    pub fn column_i64(&self, column: &str) -> Option<i64> {
        self.payload.get(column).and_then(Value::as_i64)
    }
}

/// A persisted row as read back from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub audit: Audit,
    pub payload: Value,
}

impl Row {
    /// Rebuilds the typed entity, applying the row's audit columns.
    pub fn into_entity<T: Entity>(self) -> serde_json::Result<T> {
        let mut entity: T = serde_json::from_value(self.payload)?;
        *entity.audit_mut() = self.audit;
        Ok(entity)
    }

    pub fn id(&self) -> Option<i64> {
        self.audit.id
    }

    /// Reads a top-level payload field as an integer.
    pub fn column_i64(&self, column: &str) -> Option<i64> {
        self.payload.get(column).and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Role, UserRole};

    #[test]
    fn test_record_captures_metadata() {
        let role = Role::new("Admin", "system");
        let record = Record::from_entity(&role).unwrap();

        assert_eq!(record.table, "roles");
        assert!(record.type_name.ends_with("Role"));
        assert_eq!(record.unique_keys.len(), 1);
        assert_eq!(record.unique_keys[0].value, "ADMIN");
        assert_eq!(record.referenced_by.len(), 1);
    }

    #[test]
    fn test_audit_columns_override_payload() {
        let role = Role::new("Admin", "system");
        let mut record = Record::from_entity(&role).unwrap();
        record.audit.id = Some(42);

        let rebuilt: Role = record.into_entity().unwrap();

        assert_eq!(rebuilt.audit.id, Some(42));
        assert_eq!(rebuilt.name, "Admin");
    }

    #[test]
    fn test_column_i64_reads_foreign_key_field() {
        let link = UserRole::new(3, 9, "system");
        let record = Record::from_entity(&link).unwrap();

        assert_eq!(record.column_i64("user_id"), Some(3));
        assert_eq!(record.column_i64("role_id"), Some(9));
        assert_eq!(record.column_i64("missing"), None);
    }
}
