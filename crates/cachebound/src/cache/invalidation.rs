use cachebound_core::cache::{snapshot_key_for, Cache};
use cachebound_core::storage::CommitReport;

/// Drops the snapshot of every entity type a commit touched.
///
/// Failures are logged and skipped: an entry that could not be removed
/// still expires on its own.
pub async fn invalidate_touched(cache: &dyn Cache, report: &CommitReport) {
    for type_name in &report.touched_types {
        let key = snapshot_key_for(type_name);
        match cache.remove(&key).await {
            Ok(()) => tracing::debug!(%key, "Invalidated snapshot"),
            Err(err) => tracing::warn!(%key, error = %err, "Failed to invalidate snapshot"),
        }
    }
}
