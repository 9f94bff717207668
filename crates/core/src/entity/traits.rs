use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

use super::Audit;

/// A table that points at another table through a foreign-key column.
///
/// Deleting a referenced row never cascades: the store rejects the delete
/// while any referrer row still points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Referrer {
    pub table: &'static str,
    pub column: &'static str,
}

/// A foreign-key value carried by a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
    pub value: i64,
}

/// A value that must be unique within its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub column: &'static str,
    pub value: String,
}

/// Trait for types persisted through a repository.
///
/// Column names used by [`ForeignKey`], [`UniqueKey`] and [`Referrer`] are
/// the serialized field names of the entity.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Backing table name.
    const TABLE: &'static str;

    /// Tables holding foreign keys into this one.
    const REFERENCED_BY: &'static [Referrer] = &[];

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;

    fn foreign_keys(&self) -> Vec<ForeignKey> {
        Vec::new()
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Fully-qualified Rust type name, used for cache keys.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
