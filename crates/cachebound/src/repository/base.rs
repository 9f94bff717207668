//! Generic cache-backed repository.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;

use cachebound_core::cache::{
    deserialize_snapshot, serialize_snapshot, snapshot_key, Cache, CachePolicy,
};
use cachebound_core::entity::{Entity, Record};
use cachebound_core::storage::{Change, RepositoryError, Result};

use crate::context::PersistenceContext;

use super::Query;

/// Repository over one entity type.
///
/// Mutations are staged in the shared [`PersistenceContext`] and only reach
/// the store when the owning unit of work commits. Reads always go through
/// the entity snapshot:
///
/// - **Hit**: the cached snapshot is deserialized and the store is not queried
/// - **Miss**: every row is loaded, serialized, written to the cache, and the
///   written bytes are deserialized again so both paths serve the same shape
///
/// Cache failures are logged and never fail a read.
pub struct Repository<T: Entity> {
    context: Arc<PersistenceContext>,
    cache: Arc<dyn Cache>,
    policy: CachePolicy,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(context: Arc<PersistenceContext>, cache: Arc<dyn Cache>, policy: CachePolicy) -> Self {
        Self {
            context,
            cache,
            policy,
            _entity: PhantomData,
        }
    }

    // Staging

    /// Stages an insert. Store-managed audit fields must be unset.
    pub fn add(&self, entity: &T) -> Result<()> {
        let change = insert_change(entity)?;
        self.context.stage(change);
        Ok(())
    }

    /// Stages several inserts. Nothing is staged if any entity is invalid.
    pub fn add_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let changes = entities
            .into_iter()
            .map(insert_change)
            .collect::<Result<Vec<_>>>()?;
        self.context.stage_all(changes);
        Ok(())
    }

    /// Stages a delete of a persisted entity.
    pub fn remove(&self, entity: &T) -> Result<()> {
        let change = persisted_change(entity, "remove", Change::Delete)?;
        self.context.stage(change);
        Ok(())
    }

    pub fn remove_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let changes = entities
            .into_iter()
            .map(|entity| persisted_change(entity, "remove", Change::Delete))
            .collect::<Result<Vec<_>>>()?;
        self.context.stage_all(changes);
        Ok(())
    }

    /// Stages a full replacement of a persisted entity's mutable fields.
    ///
    /// The commit fails with a concurrency conflict if the entity's token no
    /// longer matches the stored row.
    pub fn update(&self, entity: &T) -> Result<()> {
        let change = persisted_change(entity, "update", Change::Update)?;
        self.context.stage(change);
        Ok(())
    }

    pub fn update_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let changes = entities
            .into_iter()
            .map(|entity| persisted_change(entity, "update", Change::Update))
            .collect::<Result<Vec<_>>>()?;
        self.context.stage_all(changes);
        Ok(())
    }

    // Queries

    /// Starts a composable query.
    pub fn query(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// First match in snapshot order.
    pub async fn find_one<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.query().filter(predicate).first().await
    }

    /// First match after sorting descending by `key`.
    pub async fn find_one_ordered_desc<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query()
            .filter(predicate)
            .order_by(key)
            .descending()
            .first()
            .await
    }

    /// Last element after sorting ascending by `key`.
    pub async fn find_last<K, F>(&self, key: F) -> Result<Option<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().order_by(key).last().await
    }

    pub async fn find_last_where<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().filter(predicate).order_by(key).last().await
    }

    /// Last element after sorting descending by `key`.
    pub async fn find_last_desc<K, F>(&self, key: F) -> Result<Option<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().order_by(key).descending().last().await
    }

    pub async fn find_last_desc_where<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query()
            .filter(predicate)
            .order_by(key)
            .descending()
            .last()
            .await
    }

    /// The whole snapshot, in store order.
    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.query().all().await
    }

    pub async fn find_all_where<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.query().filter(predicate).all().await
    }

    pub async fn find_all_ordered<K, F>(&self, key: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().order_by(key).all().await
    }

    pub async fn find_all_where_ordered<P, K, F>(&self, predicate: P, key: F) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().filter(predicate).order_by(key).all().await
    }

    /// The whole snapshot, reversed.
    pub async fn find_all_desc(&self) -> Result<Vec<T>> {
        self.query().descending().all().await
    }

    pub async fn find_all_desc_where<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.query().filter(predicate).descending().all().await
    }

    pub async fn find_all_desc_ordered<K, F>(&self, key: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query().order_by(key).descending().all().await
    }

    pub async fn find_all_desc_where_ordered<P, K, F>(
        &self,
        predicate: P,
        key: F,
    ) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.query()
            .filter(predicate)
            .order_by(key)
            .descending()
            .all()
            .await
    }

    /// Loads every row straight from the store, bypassing the cache.
    pub async fn load_from_store(&self) -> Result<Vec<T>> {
        let rows = self.context.store().load(T::TABLE).await?;
        rows.into_iter()
            .map(|row| row.into_entity::<T>().map_err(RepositoryError::from))
            .collect()
    }

    /// Get-or-populate of the entity snapshot.
    pub(crate) async fn snapshot(&self) -> Result<Vec<T>> {
        let key = snapshot_key::<T>();

        match self.cache.get(&key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => match deserialize_snapshot::<T>(&bytes) {
                Ok(items) => {
                    tracing::trace!(%key, count = items.len(), "Cache hit for snapshot");
                    return Ok(items);
                }
                Err(err) => {
                    tracing::warn!(%key, error = %err, "Cached snapshot deserialization failed");
                }
            },
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%key, error = %err, "Failed to read snapshot from cache");
            }
        }

        tracing::trace!(%key, "Cache miss for snapshot");
        let items = self.load_from_store().await?;
        let bytes = serialize_snapshot(&items)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let options = self.policy.expiration.entry_options(Utc::now());
        if let Err(err) = self.cache.set(&key, &bytes, &options).await {
            tracing::warn!(%key, error = %err, "Failed to cache snapshot");
        }

        deserialize_snapshot(&bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

impl<T: Entity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &T::type_name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn insert_change<T: Entity>(entity: &T) -> Result<Change> {
    let populated = entity.audit().populated_store_fields();
    if !populated.is_empty() {
        return Err(RepositoryError::InvalidArgument(format!(
            "cannot add to {}: store-managed fields already set ({})",
            T::TABLE,
            populated.join(", ")
        )));
    }
    Ok(Change::Insert(Record::from_entity(entity)?))
}

fn persisted_change<T: Entity>(
    entity: &T,
    operation: &str,
    change: fn(Record) -> Change,
) -> Result<Change> {
    if entity.audit().id.is_none() {
        return Err(RepositoryError::InvalidArgument(format!(
            "cannot {operation} in {}: entity has no id",
            T::TABLE
        )));
    }
    Ok(change(Record::from_entity(entity)?))
}
