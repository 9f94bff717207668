use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque version marker compared by the store on every write.
///
/// A fresh token is issued by the store on every successful insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcurrencyToken(Uuid);

impl ConcurrencyToken {
    /// Issues a new, never-before-seen token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing token value (e.g. one read back from a database column).
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Small caller-defined status flag. The repository layer never interprets it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RowStatus(pub i16);

impl RowStatus {
    pub fn value(self) -> i16 {
        self.0
    }
}

/// Audit columns shared by every persisted entity.
///
/// `id`, `external_id`, `created_at_utc`, `modified_at_utc` and
/// `concurrency_token` are owned by the store: they are `None` on a freshly
/// built entity and populated when the unit of work commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub id: Option<i64>,
    pub external_id: Option<Uuid>,
    pub created_by: String,
    pub created_at_utc: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    pub modified_at_utc: Option<DateTime<Utc>>,
    pub concurrency_token: Option<ConcurrencyToken>,
    pub row_status: RowStatus,
}

impl Audit {
    /// Creates audit data for an entity that has not been persisted yet.
    pub fn new(created_by: impl Into<String>) -> Self {
        Self {
            id: None,
            external_id: None,
            created_by: created_by.into(),
            created_at_utc: None,
            modified_by: None,
            modified_at_utc: None,
            concurrency_token: None,
            row_status: RowStatus::default(),
        }
    }

    /// Sets the row status flag.
    pub fn with_row_status(mut self, row_status: RowStatus) -> Self {
        self.row_status = row_status;
        self
    }

    /// Returns true once the store has assigned a surrogate key.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Records who is modifying the entity. The timestamp is set by the store.
    pub fn touch(&mut self, modified_by: impl Into<String>) {
        self.modified_by = Some(modified_by.into());
    }

    /// Names of store-managed fields that are already populated.
    ///
    /// A non-empty result means the entity cannot be staged for insertion.
    pub fn populated_store_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.id.is_some() {
            fields.push("id");
        }
        if self.external_id.is_some() {
            fields.push("external_id");
        }
        if self.created_at_utc.is_some() {
            fields.push("created_at_utc");
        }
        if self.modified_at_utc.is_some() {
            fields.push("modified_at_utc");
        }
        if self.concurrency_token.is_some() {
            fields.push("concurrency_token");
        }
        fields
    }
}
