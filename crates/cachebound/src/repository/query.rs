//! Composable query builder over a repository snapshot.

use tokio_util::sync::CancellationToken;

use cachebound_core::entity::Entity;
use cachebound_core::query::{Direction, QueryPlan};
use cachebound_core::storage::Result;

use crate::cancel::run_cancellable;

use super::Repository;

/// A query against one repository, built up before it runs.
///
/// Filtering and ordering always run in memory on the whole entity
/// snapshot, after it has been served from the cache or the store.
///
/// ```rust,ignore
/// let newest = wrapper
///     .roles()
///     .query()
///     .filter(|r| r.description.is_some())
///     .order_by(|r| r.audit.created_at_utc)
///     .descending()
///     .first()
///     .await?;
/// ```
#[must_use = "a query does nothing until a terminal method is awaited"]
pub struct Query<'r, T: Entity> {
    repository: &'r Repository<T>,
    plan: QueryPlan<T>,
    cancel: Option<CancellationToken>,
}

impl<'r, T: Entity> Query<'r, T> {
    pub(super) fn new(repository: &'r Repository<T>) -> Self {
        Self {
            repository,
            plan: QueryPlan::new(),
            cancel: None,
        }
    }

    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.plan = self.plan.filter(predicate);
        self
    }

    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.plan = self.plan.order_by(key);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.plan = self.plan.direction(direction);
        self
    }

    pub fn descending(self) -> Self {
        self.direction(Direction::Descending)
    }

    /// Aborts the query with `RepositoryError::Cancelled` once `token` fires.
    pub fn cancel_on(mut self, token: &CancellationToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    /// Every matching entity, in planned order.
    pub async fn all(self) -> Result<Vec<T>> {
        let snapshot = self.snapshot().await?;
        Ok(self.plan.apply(snapshot))
    }

    pub async fn first(self) -> Result<Option<T>> {
        let snapshot = self.snapshot().await?;
        Ok(self.plan.first(snapshot))
    }

    pub async fn last(self) -> Result<Option<T>> {
        let snapshot = self.snapshot().await?;
        Ok(self.plan.last(snapshot))
    }

    pub async fn count(self) -> Result<usize> {
        Ok(self.all().await?.len())
    }

    async fn snapshot(&self) -> Result<Vec<T>> {
        run_cancellable(self.cancel.as_ref(), self.repository.snapshot()).await
    }
}
