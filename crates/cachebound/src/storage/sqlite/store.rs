//! SQLite store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Transaction};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use cachebound_core::entity::{Record, Row};
use cachebound_core::storage::{
    insert_audit, update_audit, Change, CommitReport, Store, StoreError, StoreResult,
};

use super::conversions::{format_datetime, format_token, sql_row_to_row};
use super::error::{domain_err, map_rusqlite_error, map_tokio_rusqlite_error, wrap_err};
use super::schema;

/// SQLite-based store.
///
/// All statements run on the single `tokio_rusqlite` connection thread, and
/// a commit is one transaction, so commits are serialized.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a file-based database.
    ///
    /// Tables are created on first use.
    pub async fn new(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

fn ensure_table(conn: &rusqlite::Connection, table: &'static str) -> StoreResult<()> {
    if !schema::is_valid_table_name(table) {
        return Err(StoreError::QueryFailed(format!(
            "invalid table name '{table}'"
        )));
    }
    conn.execute_batch(&schema::create_table(table))
        .map_err(|e| map_rusqlite_error(&e, table))
}

fn exists(
    tx: &Transaction<'_>,
    table: &'static str,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<bool> {
    tx.query_row(sql, params, |row| row.get::<_, bool>(0))
        .map_err(|e| map_rusqlite_error(&e, table))
}

fn check_foreign_keys(tx: &Transaction<'_>, record: &Record) -> StoreResult<()> {
    for fk in &record.foreign_keys {
        ensure_table(tx, fk.references)?;
        let found = exists(
            tx,
            fk.references,
            &schema::exists_by_id(fk.references),
            params![fk.value],
        )?;
        if !found {
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

fn check_unique_keys(
    tx: &Transaction<'_>,
    record: &Record,
    own_id: Option<i64>,
) -> StoreResult<()> {
    let sql = schema::exists_unique_value(record.table);
    for key in &record.unique_keys {
        let taken = exists(
            tx,
            record.table,
            &sql,
            params![schema::json_path(key.column), key.value, own_id],
        )?;
        if taken {
            return Err(StoreError::ConstraintViolation {
                table: record.table,
                constraint: format!("unique {} '{}'", key.column, key.value),
            });
        }
    }
    Ok(())
}

fn check_referrers(tx: &Transaction<'_>, record: &Record, id: i64) -> StoreResult<()> {
    for referrer in record.referenced_by {
        ensure_table(tx, referrer.table)?;
        let referenced = exists(
            tx,
            referrer.table,
            &schema::exists_reference(referrer.table),
            params![schema::json_path(referrer.column), id],
        )?;
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

fn apply_change(
    tx: &Transaction<'_>,
    change: Change,
    now: DateTime<Utc>,
    report: &mut CommitReport,
) -> StoreResult<()> {
    let table = change.table();
    ensure_table(tx, table)?;
    let sql_err = |e: rusqlite::Error| map_rusqlite_error(&e, table);
    let conflict = |id: i64| StoreError::ConcurrencyConflict { table, id };

    match change {
        Change::Insert(record) => {
            check_foreign_keys(tx, &record)?;
            check_unique_keys(tx, &record, None)?;

            let id: i64 = tx
                .query_row(schema::NEXT_ID, params![table], |row| row.get(0))
                .map_err(sql_err)?;
            let external_id = Uuid::new_v4();
            let audit = insert_audit(&record.audit, id, external_id, now);

            tx.execute(
                &schema::insert(table),
                params![
                    id,
                    external_id.to_string(),
                    audit.created_by,
                    audit.created_at_utc.as_ref().map(format_datetime),
                    format_token(audit.concurrency_token),
                    audit.row_status.value(),
                    record.payload.to_string(),
                ],
            )
            .map_err(sql_err)?;
            report.record_insert(&record, id, external_id);
        }
        Change::Update(record) => {
            let id = record.audit.id.ok_or_else(|| conflict(0))?;
            let stored = tx
                .query_row(&schema::select_by_id(table), params![id], sql_row_to_row)
                .optional()
                .map_err(sql_err)?
                .ok_or_else(|| conflict(id))?;

            check_foreign_keys(tx, &record)?;
            check_unique_keys(tx, &record, Some(id))?;

            let audit = update_audit(&record.audit, &stored.audit, now);
            let changed = tx
                .execute(
                    &schema::update(table),
                    params![
                        id,
                        format_token(record.audit.concurrency_token),
                        audit.modified_by,
                        audit.modified_at_utc.as_ref().map(format_datetime),
                        format_token(audit.concurrency_token),
                        audit.row_status.value(),
                        record.payload.to_string(),
                    ],
                )
                .map_err(sql_err)?;
            if changed == 0 {
                return Err(conflict(id));
            }
            report.record_update(&record);
        }
        Change::Delete(record) => {
            let id = record.audit.id.ok_or_else(|| conflict(0))?;
            let changed = tx
                .execute(
                    &schema::delete(table),
                    params![id, format_token(record.audit.concurrency_token)],
                )
                .map_err(sql_err)?;
            if changed == 0 {
                return Err(conflict(id));
            }

            check_referrers(tx, &record, id)?;
            report.record_delete(&record);
        }
    }
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn load(&self, table: &'static str) -> StoreResult<Vec<Row>> {
        self.conn
            .call(move |conn| {
                ensure_table(conn, table).map_err(domain_err)?;
                let mut stmt = conn.prepare(&schema::select_all(table)).map_err(wrap_err)?;
                let rows = stmt.query_map([], sql_row_to_row).map_err(wrap_err)?;

                let mut loaded = Vec::new();
                for row_result in rows {
                    loaded.push(row_result.map_err(wrap_err)?);
                }
                Ok(loaded)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, table))
    }

    async fn commit(&self, changes: Vec<Change>) -> StoreResult<CommitReport> {
        let Some(first_table) = changes.first().map(Change::table) else {
            return Ok(CommitReport::default());
        };
        let now = Utc::now();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut report = CommitReport::default();

                for change in changes {
                    apply_change(&tx, change, now, &mut report).map_err(domain_err)?;
                }

                // Dropping the transaction on an early return rolls it back
                tx.commit().map_err(wrap_err)?;
                Ok(report)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, first_table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachebound_core::entity::{Entity, Role, User, UserRole};

    fn insert<T: Entity>(entity: &T) -> Change {
        Change::Insert(Record::from_entity(entity).unwrap())
    }

    async fn load_roles(store: &SqliteStore) -> Vec<Role> {
        store
            .load("roles")
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.into_entity().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        let report = store
            .commit(vec![
                insert(&Role::new("Admin", "system").with_description("All access")),
                insert(&Role::new("Editor", "system")),
            ])
            .await
            .unwrap();

        let roles = load_roles(&store).await;
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].name, "Admin");
        assert_eq!(roles[0].description.as_deref(), Some("All access"));
        assert_eq!(roles[0].audit.id, Some(report.inserted[0].id));
        assert_eq!(
            roles[0].audit.external_id,
            Some(report.inserted[0].external_id)
        );
        assert!(roles[0].audit.created_at_utc.is_some());
        assert!(roles[0].audit.concurrency_token.is_some());
        assert!(roles[0].audit.modified_at_utc.is_none());
    }

    #[tokio::test]
    async fn test_load_empty_table() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        assert!(store.load("roles").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_token_and_preserves_creation() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .commit(vec![insert(&Role::new("Admin", "alice"))])
            .await
            .unwrap();
        let original = load_roles(&store).await.remove(0);

        let mut changed = original.clone();
        changed.rename("Owner");
        changed.audit.created_by = "mallory".to_string();
        changed.audit.touch("bob");
        store
            .commit(vec![Change::Update(Record::from_entity(&changed).unwrap())])
            .await
            .unwrap();

        let updated = load_roles(&store).await.remove(0);
        assert_eq!(updated.name, "Owner");
        assert_eq!(updated.audit.created_by, "alice");
        assert_eq!(updated.audit.created_at_utc, original.audit.created_at_utc);
        assert_eq!(updated.audit.modified_by.as_deref(), Some("bob"));
        assert!(updated.audit.modified_at_utc.is_some());
        assert_ne!(
            updated.audit.concurrency_token,
            original.audit.concurrency_token
        );
    }

    #[tokio::test]
    async fn test_stale_update_conflicts_and_rolls_back() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .commit(vec![insert(&Role::new("Admin", "system"))])
            .await
            .unwrap();
        let original = load_roles(&store).await.remove(0);

        let mut first = original.clone();
        first.rename("Owner");
        store
            .commit(vec![Change::Update(Record::from_entity(&first).unwrap())])
            .await
            .unwrap();

        let mut stale = original;
        stale.rename("Root");
        let result = store
            .commit(vec![
                insert(&Role::new("Viewer", "system")),
                Change::Update(Record::from_entity(&stale).unwrap()),
            ])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { table: "roles", .. })
        ));
        let roles = load_roles(&store).await;
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "Owner");
    }

    #[tokio::test]
    async fn test_unique_violation() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .commit(vec![insert(&Role::new("Admin", "system"))])
            .await
            .unwrap();

        let result = store.commit(vec![insert(&Role::new("admin", "system"))]).await;

        assert!(matches!(
            result,
            Err(StoreError::ConstraintViolation { table: "roles", .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_foreign_key_is_rejected() {
        let store = SqliteStore::new_in_memory().await.unwrap();

        let result = store
            .commit(vec![insert(&UserRole::new(10, 20, "system"))])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConstraintViolation {
                table: "user_roles",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_referenced_role_is_rejected() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let report = store
            .commit(vec![
                insert(&Role::new("Admin", "system")),
                insert(&User::new("alice", "alice@example.com", "system")),
            ])
            .await
            .unwrap();
        let (role_id, user_id) = (report.inserted[0].id, report.inserted[1].id);
        store
            .commit(vec![insert(&UserRole::new(user_id, role_id, "system"))])
            .await
            .unwrap();

        let role = load_roles(&store).await.remove(0);
        let result = store
            .commit(vec![Change::Delete(Record::from_entity(&role).unwrap())])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConstraintViolation { table: "roles", .. })
        ));
        assert_eq!(load_roles(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = SqliteStore::new_in_memory().await.unwrap();
        store
            .commit(vec![insert(&Role::new("Admin", "system"))])
            .await
            .unwrap();
        let role = load_roles(&store).await.remove(0);
        store
            .commit(vec![Change::Delete(Record::from_entity(&role).unwrap())])
            .await
            .unwrap();

        let report = store
            .commit(vec![insert(&Role::new("Admin", "system"))])
            .await
            .unwrap();

        assert_eq!(report.inserted[0].id, 2);
    }
}
