//! In-memory store implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use cachebound_core::entity::{Record, Row, UniqueKey};
use cachebound_core::storage::{
    insert_audit, update_audit, Change, CommitReport, Store, StoreError, StoreResult,
};

use super::constraints::{check_foreign_keys, check_referrers, check_unique_keys};

#[derive(Debug, Clone)]
pub(super) struct StoredRow {
    pub row: Row,
    pub unique_keys: Vec<UniqueKey>,
}

/// All tables, keyed by table name then row id.
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    pub rows: HashMap<&'static str, BTreeMap<i64, StoredRow>>,
    last_id: HashMap<&'static str, i64>,
}

impl Tables {
    pub fn contains(&self, table: &str, id: i64) -> bool {
        self.rows
            .get(table)
            .is_some_and(|rows| rows.contains_key(&id))
    }

    fn next_id(&mut self, table: &'static str) -> i64 {
        let last = self.last_id.entry(table).or_insert(0);
        *last += 1;
        *last
    }

    fn stored(&self, record: &Record) -> StoreResult<(i64, &StoredRow)> {
        let conflict = || StoreError::ConcurrencyConflict {
            table: record.table,
            id: record.audit.id.unwrap_or_default(),
        };
        let id = record.audit.id.ok_or_else(conflict)?;
        let stored = self
            .rows
            .get(record.table)
            .and_then(|rows| rows.get(&id))
            .ok_or_else(conflict)?;
        Ok((id, stored))
    }

    fn apply(
        &mut self,
        change: Change,
        now: DateTime<Utc>,
        report: &mut CommitReport,
    ) -> StoreResult<()> {
        match change {
            Change::Insert(record) => {
                check_foreign_keys(self, &record)?;
                check_unique_keys(self, &record, None)?;

                let id = self.next_id(record.table);
                let external_id = Uuid::new_v4();
                let audit = insert_audit(&record.audit, id, external_id, now);
                report.record_insert(&record, id, external_id);

                self.rows.entry(record.table).or_default().insert(
                    id,
                    StoredRow {
                        row: Row {
                            audit,
                            payload: record.payload,
                        },
                        unique_keys: record.unique_keys,
                    },
                );
            }
            Change::Update(record) => {
                let (id, stored) = self.stored(&record)?;
                if stored.row.audit.concurrency_token != record.audit.concurrency_token {
                    return Err(StoreError::ConcurrencyConflict {
                        table: record.table,
                        id,
                    });
                }
                let audit = update_audit(&record.audit, &stored.row.audit, now);

                check_foreign_keys(self, &record)?;
                check_unique_keys(self, &record, Some(id))?;
                report.record_update(&record);

                self.rows.entry(record.table).or_default().insert(
                    id,
                    StoredRow {
                        row: Row {
                            audit,
                            payload: record.payload,
                        },
                        unique_keys: record.unique_keys,
                    },
                );
            }
            Change::Delete(record) => {
                let (id, stored) = self.stored(&record)?;
                if record
                    .audit
                    .concurrency_token
                    .is_some_and(|token| stored.row.audit.concurrency_token != Some(token))
                {
                    return Err(StoreError::ConcurrencyConflict {
                        table: record.table,
                        id,
                    });
                }

                check_referrers(self, &record, id)?;
                report.record_delete(&record);

                if let Some(rows) = self.rows.get_mut(record.table) {
                    rows.remove(&id);
                }
            }
        }
        Ok(())
    }
}

/// In-memory store for tests and single-process deployments.
///
/// A commit validates and applies every change against a copy of the
/// tables while holding the write lock, and only swaps the copy in when
/// all changes succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.rows.get(table).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load(&self, table: &'static str) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows
            .get(table)
            .map(|rows| rows.values().map(|stored| stored.row.clone()).collect())
            .unwrap_or_default())
    }

    async fn commit(&self, changes: Vec<Change>) -> StoreResult<CommitReport> {
        let mut tables = self.tables.write().await;
        let mut working = tables.clone();
        let mut report = CommitReport::default();
        let now = Utc::now();

        for change in changes {
            working.apply(change, now, &mut report)?;
        }

        *tables = working;
        Ok(report)
    }
}
