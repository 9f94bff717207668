//! Behaviour every entity repository must share, run against each alias.

use std::num::NonZeroUsize;
use std::sync::Arc;

use cachebound_core::cache::{CachePolicy, ExpirationSettings};
use cachebound_core::entity::{Entity, Record, Role, User, UserRole};
use cachebound_core::storage::{Change, RepositoryError, Store, StoreError};

use crate::cache::MemoryCache;
use crate::context::PersistenceContext;
use crate::storage::InMemoryStore;

use super::{Repository, RoleRepository, UserRoleRepository};

/// An entity the contract can build samples of.
trait Subject: Entity {
    /// Rows that must exist before samples can be inserted.
    fn dependencies() -> Vec<Change> {
        Vec::new()
    }

    /// The n-th distinct sample, `n` in `1..=3`.
    fn sample(n: i64) -> Self;

    /// Changes a mutable field.
    fn mutate(&mut self);
}

impl Subject for Role {
    fn sample(n: i64) -> Self {
        Role::new(format!("role-{n}"), "contract")
    }

    fn mutate(&mut self) {
        self.description = Some(format!("changed {}", self.name));
    }
}

impl Subject for UserRole {
    fn dependencies() -> Vec<Change> {
        let mut changes = Vec::new();
        for n in 1..=3 {
            let user = User::new(format!("user-{n}"), format!("user-{n}@example.com"), "contract");
            changes.push(Change::Insert(Record::from_entity(&user).unwrap()));
            changes.push(Change::Insert(
                Record::from_entity(&Role::new(format!("role-{n}"), "contract")).unwrap(),
            ));
        }
        changes
    }

    fn sample(n: i64) -> Self {
        UserRole::new(n, n, "contract")
    }

    fn mutate(&mut self) {
        self.role_id = self.role_id % 3 + 1;
    }
}

struct Harness<T: Entity> {
    context: Arc<PersistenceContext>,
    repo: Repository<T>,
}

async fn harness<T: Subject>(store: Arc<dyn Store>) -> Harness<T> {
    store.commit(T::dependencies()).await.unwrap();
    let context = Arc::new(PersistenceContext::new(store));
    let cache = Arc::new(MemoryCache::new(NonZeroUsize::new(16).unwrap()));
    let repo = Repository::new(
        context.clone(),
        cache,
        CachePolicy::new(ExpirationSettings::new(30, 10)),
    );
    Harness { context, repo }
}

async fn seeded<T: Subject>(store: Arc<dyn Store>) -> (Harness<T>, Vec<T>) {
    let h = harness::<T>(store).await;
    let samples: Vec<T> = (1..=3).map(T::sample).collect();
    h.repo.add_many(&samples).unwrap();
    h.context.commit(None).await.unwrap();
    let stored = h.repo.load_from_store().await.unwrap();
    (h, stored)
}

async fn check_insert_assigns_store_fields<T: Subject>(store: Arc<dyn Store>) {
    let (_, stored) = seeded::<T>(store).await;

    assert_eq!(stored.len(), 3);
    for (expected_id, entity) in (1..).zip(&stored) {
        let audit = entity.audit();
        assert_eq!(audit.id, Some(expected_id));
        assert!(audit.external_id.is_some());
        assert!(audit.created_at_utc.is_some());
        assert!(audit.concurrency_token.is_some());
        assert!(audit.modified_by.is_none());
        assert!(audit.modified_at_utc.is_none());
        assert_eq!(audit.created_by, "contract");
    }
}

async fn check_update_changes_token<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;
    let mut entity = stored[0].clone();
    let before = entity.audit().concurrency_token;
    entity.mutate();
    entity.audit_mut().touch("editor");

    h.repo.update(&entity).unwrap();
    let report = h.context.commit(None).await.unwrap();

    assert_eq!(report.updated, 1);
    let after = h.repo.load_from_store().await.unwrap().remove(0);
    assert_ne!(after.audit().concurrency_token, before);
    assert_eq!(after.audit().modified_by.as_deref(), Some("editor"));
    assert!(after.audit().modified_at_utc.is_some());
    assert_eq!(after.audit().created_at_utc, entity.audit().created_at_utc);
}

async fn check_stale_update_conflicts<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;
    let mut first = stored[1].clone();
    let mut second = stored[1].clone();

    first.mutate();
    h.repo.update(&first).unwrap();
    h.context.commit(None).await.unwrap();
    let after_first = h.repo.load_from_store().await.unwrap();

    second.audit_mut().touch("late");
    h.repo.update(&second).unwrap();
    let result = h.context.commit(None).await;

    let id = stored[1].audit().id.unwrap();
    assert_eq!(
        result,
        Err(RepositoryError::Store(StoreError::ConcurrencyConflict {
            table: T::TABLE,
            id
        }))
    );
    assert_eq!(h.repo.load_from_store().await.unwrap(), after_first);
    assert_eq!(h.context.pending(), 0);
}

async fn check_remove_deletes<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;

    h.repo.remove(&stored[2]).unwrap();
    let report = h.context.commit(None).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(h.repo.load_from_store().await.unwrap(), stored[..2].to_vec());
}

async fn check_find_all_is_restartable<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;

    let first = h.repo.find_all().await.unwrap();
    let second = h.repo.find_all().await.unwrap();

    assert_eq!(first, stored);
    assert_eq!(first, second);
}

async fn check_rollback_discards<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;

    h.repo.remove(&stored[0]).unwrap();
    assert_eq!(h.context.discard(), 1);
    let report = h.context.commit(None).await.unwrap();

    assert!(report.is_empty());
    assert_eq!(h.repo.load_from_store().await.unwrap().len(), 3);
}

async fn check_find_last_by_id<T: Subject>(store: Arc<dyn Store>) {
    let (h, stored) = seeded::<T>(store).await;

    let newest = h.repo.find_last(|e: &T| e.audit().id).await.unwrap();
    let oldest = h.repo.find_last_desc(|e: &T| e.audit().id).await.unwrap();

    assert_eq!(newest.as_ref(), stored.last());
    assert_eq!(oldest.as_ref(), stored.first());
}

macro_rules! contract_tests {
    ($module:ident, $repository:ty, $entity:ty, $store:expr) => {
        mod $module {
            use super::*;

            // Pins the alias to the entity the contract instantiates.
            #[allow(dead_code)]
            fn alias(repository: $repository) -> Repository<$entity> {
                repository
            }

            #[tokio::test]
            async fn test_insert_assigns_store_fields() {
                check_insert_assigns_store_fields::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_update_changes_token() {
                check_update_changes_token::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_stale_update_conflicts() {
                check_stale_update_conflicts::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_remove_deletes() {
                check_remove_deletes::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_find_all_is_restartable() {
                check_find_all_is_restartable::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_rollback_discards() {
                check_rollback_discards::<$entity>($store).await;
            }

            #[tokio::test]
            async fn test_find_last_by_id() {
                check_find_last_by_id::<$entity>($store).await;
            }
        }
    };
}

fn inmemory() -> Arc<dyn Store> {
    Arc::new(InMemoryStore::new())
}

contract_tests!(role_repository, RoleRepository, Role, inmemory());
contract_tests!(user_role_repository, UserRoleRepository, UserRole, inmemory());

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::SqliteStore;

    async fn store() -> Arc<dyn Store> {
        Arc::new(SqliteStore::new_in_memory().await.unwrap())
    }

    contract_tests!(role_repository, RoleRepository, Role, store().await);
    contract_tests!(user_role_repository, UserRoleRepository, UserRole, store().await);
}
