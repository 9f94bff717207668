//! Persistence context shared by every repository of one unit of work.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use cachebound_core::storage::{Change, CommitReport, RepositoryError, Result, Store};

/// Ordered list of staged changes.
#[derive(Debug, Default)]
struct ChangeTracker {
    staged: Mutex<Vec<Change>>,
}

impl ChangeTracker {
    fn lock(&self) -> MutexGuard<'_, Vec<Change>> {
        // A panic while staging cannot leave the Vec half-written.
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, change: Change) {
        self.lock().push(change);
    }

    fn extend(&self, changes: Vec<Change>) {
        self.lock().extend(changes);
    }

    fn drain(&self) -> Vec<Change> {
        std::mem::take(&mut *self.lock())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Store handle plus the changes staged against it.
pub struct PersistenceContext {
    store: Arc<dyn Store>,
    tracker: ChangeTracker,
}

impl PersistenceContext {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            tracker: ChangeTracker::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn stage(&self, change: Change) {
        self.tracker.push(change);
    }

    pub fn stage_all(&self, changes: Vec<Change>) {
        self.tracker.extend(changes);
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Drops every staged change, returning how many were discarded.
    pub fn discard(&self) -> usize {
        self.tracker.drain().len()
    }

    /// Sends every staged change to the store as one atomic batch.
    ///
    /// Staged changes are taken before the store is called, so they are
    /// gone whether the commit succeeds, fails or is cancelled.
    ///
    /// `cancel` is only honoured before the batch reaches the store. Once
    /// dispatched, the commit runs to completion and its real outcome is
    /// returned, so `Cancelled` always means nothing was written.
    pub async fn commit(&self, cancel: Option<&CancellationToken>) -> Result<CommitReport> {
        let changes = self.tracker.drain();
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!(discarded = changes.len(), "Commit cancelled before dispatch");
            return Err(RepositoryError::Cancelled);
        }
        if changes.is_empty() {
            return Ok(CommitReport::default());
        }

        let count = changes.len();
        let report = self.store.commit(changes).await?;

        tracing::debug!(
            staged = count,
            inserted = report.inserted.len(),
            updated = report.updated,
            deleted = report.deleted,
            "Committed unit of work"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for PersistenceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceContext")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::time::Duration;

    use async_trait::async_trait;
    use cachebound_core::entity::{Record, Role, Row};
    use cachebound_core::storage::StoreResult;

    /// Delays every commit so a token can fire while it is in flight.
    struct SlowStore {
        inner: InMemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl Store for SlowStore {
        async fn load(&self, table: &'static str) -> StoreResult<Vec<Row>> {
            self.inner.load(table).await
        }

        async fn commit(&self, changes: Vec<Change>) -> StoreResult<CommitReport> {
            tokio::time::sleep(self.delay).await;
            self.inner.commit(changes).await
        }
    }

    fn insert(name: &str) -> Change {
        Change::Insert(Record::from_entity(&Role::new(name, "system")).unwrap())
    }

    fn context(store: &InMemoryStore) -> PersistenceContext {
        PersistenceContext::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_commit_applies_in_staging_order() {
        let store = InMemoryStore::new();
        let ctx = context(&store);
        ctx.stage(insert("First"));
        ctx.stage_all(vec![insert("Second"), insert("Third")]);

        let report = ctx.commit(None).await.unwrap();

        let ids: Vec<i64> = report.inserted.iter().map(|k| k.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(ctx.pending(), 0);
    }

    #[tokio::test]
    async fn test_empty_commit_is_noop() {
        let ctx = context(&InMemoryStore::new());
        let report = ctx.commit(None).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_drains_staged_changes() {
        let store = InMemoryStore::new();
        let ctx = context(&store);
        ctx.stage_all(vec![insert("Admin"), insert("admin")]);

        let result = ctx.commit(None).await;

        assert!(matches!(result, Err(RepositoryError::Store(_))));
        assert_eq!(ctx.pending(), 0);
        assert_eq!(store.row_count("roles").await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_commit_writes_nothing() {
        let store = InMemoryStore::new();
        let ctx = context(&store);
        ctx.stage(insert("Admin"));
        let token = CancellationToken::new();
        token.cancel();

        let result = ctx.commit(Some(&token)).await;

        assert_eq!(result, Err(RepositoryError::Cancelled));
        assert_eq!(ctx.pending(), 0);
        assert_eq!(store.row_count("roles").await, 0);
    }

    #[tokio::test]
    async fn test_cancel_after_dispatch_reports_real_outcome() {
        let store = InMemoryStore::new();
        let ctx = PersistenceContext::new(Arc::new(SlowStore {
            inner: store.clone(),
            delay: Duration::from_millis(50),
        }));
        ctx.stage(insert("Admin"));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let report = ctx.commit(Some(&token)).await.unwrap();

        assert!(token.is_cancelled());
        assert_eq!(report.inserted.len(), 1);
        assert_eq!(store.row_count("roles").await, 1);
    }

    #[tokio::test]
    async fn test_discard() {
        let ctx = context(&InMemoryStore::new());
        ctx.stage(insert("Admin"));

        assert_eq!(ctx.discard(), 1);
        assert_eq!(ctx.pending(), 0);
    }
}
