use async_trait::async_trait;

use crate::entity::Row;

use super::{Change, CommitReport, StoreResult};

/// Relational backend behind a persistence context.
///
/// Implementations must apply a commit atomically: either every change is
/// persisted or none is. Loaded rows come back in ascending `id` order.
#[async_trait]
pub trait Store: Send + Sync {
    /// Loads every row of a table.
    async fn load(&self, table: &'static str) -> StoreResult<Vec<Row>>;

    /// Applies a batch of changes in order, as one transaction.
    async fn commit(&self, changes: Vec<Change>) -> StoreResult<CommitReport>;
}
