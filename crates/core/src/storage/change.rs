//! Staged mutations and the outcome of committing them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{Audit, ConcurrencyToken, Record};

/// A staged mutation of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Record),
    Update(Record),
    Delete(Record),
}

impl Change {
    pub fn record(&self) -> &Record {
        match self {
            Self::Insert(record) | Self::Update(record) | Self::Delete(record) => record,
        }
    }

    pub fn table(&self) -> &'static str {
        self.record().table
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// Keys assigned by the store to a newly inserted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedKey {
    pub table: &'static str,
    pub id: i64,
    pub external_id: Uuid,
}

/// Summary of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub inserted: Vec<InsertedKey>,
    pub updated: usize,
    pub deleted: usize,
    /// Entity type names with at least one persisted change.
    pub touched_types: BTreeSet<&'static str>,
}

impl CommitReport {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.inserted.len() + self.updated + self.deleted
    }

    pub fn record_insert(&mut self, record: &Record, id: i64, external_id: Uuid) {
        self.inserted.push(InsertedKey {
            table: record.table,
            id,
            external_id,
        });
        self.touched_types.insert(record.type_name);
    }

    pub fn record_update(&mut self, record: &Record) {
        self.updated += 1;
        self.touched_types.insert(record.type_name);
    }

    pub fn record_delete(&mut self, record: &Record) {
        self.deleted += 1;
        self.touched_types.insert(record.type_name);
    }
}

/// Audit columns a store writes for a new row.
pub fn insert_audit(requested: &Audit, id: i64, external_id: Uuid, now: DateTime<Utc>) -> Audit {
    Audit {
        id: Some(id),
        external_id: Some(external_id),
        created_by: requested.created_by.clone(),
        created_at_utc: Some(now),
        modified_by: None,
        modified_at_utc: None,
        concurrency_token: Some(ConcurrencyToken::generate()),
        row_status: requested.row_status,
    }
}

/// Audit columns a store writes when replacing `stored` with `requested`.
///
/// Identity and creation columns always keep their stored values.
pub fn update_audit(requested: &Audit, stored: &Audit, now: DateTime<Utc>) -> Audit {
    Audit {
        id: stored.id,
        external_id: stored.external_id,
        created_by: stored.created_by.clone(),
        created_at_utc: stored.created_at_utc,
        modified_by: requested.modified_by.clone(),
        modified_at_utc: Some(now),
        concurrency_token: Some(ConcurrencyToken::generate()),
        row_status: requested.row_status,
    }
}
