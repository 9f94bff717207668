//! Cooperative cancellation for repository operations.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use cachebound_core::storage::{RepositoryError, Result};

/// Runs `operation` unless `token` fires first.
///
/// A token that is already cancelled wins before `operation` is polled.
pub async fn run_cancellable<F, T>(token: Option<&CancellationToken>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(token) = token else {
        return operation.await;
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(RepositoryError::Cancelled),
        result = operation => result,
    }
}
