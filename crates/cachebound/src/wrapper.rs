//! Unit of work over every repository.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cachebound_core::cache::{Cache, CachePolicy, InvalidationPolicy};
use cachebound_core::entity::Entity;
use cachebound_core::identity::UserManager;
use cachebound_core::storage::{CommitReport, Result, Store};

use crate::cache::invalidate_touched;
use crate::context::PersistenceContext;
use crate::identity::StoreUserManager;
use crate::repository::{AuthRepository, Repository, RoleRepository, UserRoleRepository};

/// Shared backends from which units of work are started.
///
/// Cheap to clone; keep one per process and call [`begin`](Self::begin) once
/// per logical operation.
#[derive(Clone)]
pub struct RepositoryWrapperFactory {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    policy: CachePolicy,
    user_manager: Arc<dyn UserManager>,
}

impl RepositoryWrapperFactory {
    /// Uses a [`StoreUserManager`] over the same store and cache.
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn Cache>, policy: CachePolicy) -> Self {
        let user_manager = Arc::new(StoreUserManager::new(
            store.clone(),
            cache.clone(),
            policy,
        ));
        Self {
            store,
            cache,
            policy,
            user_manager,
        }
    }

    pub fn with_user_manager(mut self, user_manager: Arc<dyn UserManager>) -> Self {
        self.user_manager = user_manager;
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn repository<T: Entity>(&self, context: &Arc<PersistenceContext>) -> Repository<T> {
        Repository::new(context.clone(), self.cache.clone(), self.policy)
    }

    /// Starts a new unit of work with nothing staged.
    pub fn begin(&self) -> RepositoryWrapper {
        RepositoryWrapper::new(self)
    }
}

impl std::fmt::Debug for RepositoryWrapperFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryWrapperFactory")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// One unit of work.
///
/// Every repository is built up front and shares a single persistence
/// context, so changes staged through any of them are committed together,
/// in staging order, or not at all.
///
/// ```rust,ignore
/// let uow = factory.begin();
/// let admin = uow.roles().find_one(|r| r.normalized_name == "ADMIN").await?;
/// uow.user_roles().add(&UserRole::new(user_id, admin_id, "alice"))?;
/// uow.commit().await?;
/// ```
pub struct RepositoryWrapper {
    context: Arc<PersistenceContext>,
    cache: Arc<dyn Cache>,
    policy: CachePolicy,
    auth: AuthRepository,
    roles: RoleRepository,
    user_roles: UserRoleRepository,
}

impl RepositoryWrapper {
    fn new(factory: &RepositoryWrapperFactory) -> Self {
        let context = Arc::new(PersistenceContext::new(factory.store.clone()));

        Self {
            auth: AuthRepository::new(
                factory.repository(&context),
                factory.user_manager.clone(),
            ),
            roles: factory.repository(&context),
            user_roles: factory.repository(&context),
            cache: factory.cache.clone(),
            policy: factory.policy,
            context,
        }
    }

    pub fn auth(&self) -> &AuthRepository {
        &self.auth
    }

    pub fn roles(&self) -> &RoleRepository {
        &self.roles
    }

    pub fn user_roles(&self) -> &UserRoleRepository {
        &self.user_roles
    }

    /// Number of changes staged and not yet committed.
    pub fn pending_changes(&self) -> usize {
        self.context.pending()
    }

    /// Discards every staged change without touching the store.
    pub fn rollback(&self) -> usize {
        let discarded = self.context.discard();
        if discarded > 0 {
            tracing::debug!(discarded, "Rolled back unit of work");
        }
        discarded
    }

    /// Applies every staged change atomically.
    pub async fn commit(&self) -> Result<CommitReport> {
        self.commit_with(None).await
    }

    /// Like [`commit`](Self::commit), but returns
    /// `RepositoryError::Cancelled` without touching the store when `token`
    /// has fired before the batch is dispatched.
    ///
    /// Staged changes are discarded whatever the outcome. Once dispatched,
    /// the commit runs to completion and reports what the store did.
    pub async fn commit_cancellable(&self, token: &CancellationToken) -> Result<CommitReport> {
        self.commit_with(Some(token)).await
    }

    async fn commit_with(&self, token: Option<&CancellationToken>) -> Result<CommitReport> {
        let report = self.context.commit(token).await?;
        if self.policy.invalidation == InvalidationPolicy::OnCommit {
            invalidate_touched(self.cache.as_ref(), &report).await;
        }
        Ok(report)
    }
}

impl std::fmt::Debug for RepositoryWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryWrapper")
            .field("pending_changes", &self.pending_changes())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
