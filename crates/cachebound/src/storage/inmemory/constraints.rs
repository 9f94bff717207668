//! Referential and uniqueness checks run against the working copy of a commit.

use cachebound_core::entity::Record;
use cachebound_core::storage::{StoreError, StoreResult};

use super::store::Tables;

/// Every foreign key must point at an existing row.
pub(super) fn check_foreign_keys(tables: &Tables, record: &Record) -> StoreResult<()> {
    for fk in &record.foreign_keys {
        if !tables.contains(fk.references, fk.value) {
            return Err(StoreError::ConstraintViolation {
                table: record.table,
                constraint: format!(
                    "{} references missing {} row {}",
                    fk.column, fk.references, fk.value
                ),
            });
        }
    }
    Ok(())
}

/// No other row of the table may hold the same unique value.
pub(super) fn check_unique_keys(
    tables: &Tables,
    record: &Record,
    own_id: Option<i64>,
) -> StoreResult<()> {
    let Some(rows) = tables.rows.get(record.table) else {
        return Ok(());
    };

    for key in &record.unique_keys {
        let taken = rows.iter().any(|(id, stored)| {
            Some(*id) != own_id
                && stored
                    .unique_keys
                    .iter()
                    .any(|k| k.column == key.column && k.value == key.value)
        });
        if taken {
            return Err(StoreError::ConstraintViolation {
                table: record.table,
                constraint: format!("unique {} '{}'", key.column, key.value),
            });
        }
    }
    Ok(())
}

/// Deletes never cascade: a row that is still referenced stays.
pub(super) fn check_referrers(tables: &Tables, record: &Record, id: i64) -> StoreResult<()> {
    for referrer in record.referenced_by {
        let referenced = tables.rows.get(referrer.table).is_some_and(|rows| {
            rows.values()
                .any(|stored| stored.row.column_i64(referrer.column) == Some(id))
        });
        if referenced {
            return Err(StoreError::ConstraintViolation {
                table: record.table,
                constraint: format!(
                    "{}.{} still references row {}",
                    referrer.table, referrer.column, id
                ),
            });
        }
    }
    Ok(())
}
