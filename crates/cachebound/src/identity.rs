//! Store-backed identity collaborator.

use std::sync::Arc;

use async_trait::async_trait;

use cachebound_core::cache::{Cache, CachePolicy, InvalidationPolicy};
use cachebound_core::entity::{normalize, Entity, Record, Role, User, UserRole};
use cachebound_core::identity::{
    ensure_unique_user, validate_user, IdentityError, Result, UserManager,
};
use cachebound_core::storage::{Change, CommitReport, Store, StoreError};

use crate::cache::invalidate_touched;

/// [`UserManager`] that reads and writes the store directly.
///
/// Identity operations must see committed data, so lookups bypass the
/// snapshot cache. Each mutating call is its own atomic commit, independent
/// of any unit of work.
#[derive(Clone)]
pub struct StoreUserManager {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
    policy: CachePolicy,
    actor: String,
}

impl StoreUserManager {
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn Cache>, policy: CachePolicy) -> Self {
        Self {
            store,
            cache,
            policy,
            actor: "identity".to_string(),
        }
    }

    /// Sets the `created_by` recorded on role assignments.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    async fn load<T: Entity>(&self) -> Result<Vec<T>> {
        let rows = self.store.load(T::TABLE).await?;
        rows.into_iter()
            .map(|row| {
                row.into_entity::<T>()
                    .map_err(|e| IdentityError::from(StoreError::Serialization(e.to_string())))
            })
            .collect()
    }

    async fn commit(&self, change: Change) -> Result<CommitReport> {
        let report = self.store.commit(vec![change]).await?;
        if self.policy.invalidation == InvalidationPolicy::OnCommit {
            invalidate_touched(self.cache.as_ref(), &report).await;
        }
        Ok(report)
    }

    fn user_id(user: &User) -> Result<i64> {
        user.audit
            .id
            .ok_or_else(|| IdentityError::UnknownUser(user.user_name.clone()))
    }
}

fn record_of<T: Entity>(entity: &T) -> Result<Record> {
    Record::from_entity(entity).map_err(|e| StoreError::Serialization(e.to_string()).into())
}

#[async_trait]
impl UserManager for StoreUserManager {
    async fn find_by_name(&self, user_name: &str) -> Result<Option<User>> {
        let wanted = normalize(user_name);
        Ok(self
            .load::<User>()
            .await?
            .into_iter()
            .find(|u| u.normalized_user_name == wanted))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let wanted = normalize(email);
        Ok(self
            .load::<User>()
            .await?
            .into_iter()
            .find(|u| u.normalized_email == wanted))
    }

    async fn create(&self, user: User) -> Result<User> {
        validate_user(&user)?;
        let existing = self.load::<User>().await?;
        ensure_unique_user(&existing, &user)?;

        let report = self.commit(Change::Insert(record_of(&user)?)).await?;
        let id = report.inserted.first().map(|key| key.id);

        let created = self
            .load::<User>()
            .await?
            .into_iter()
            .find(|u| u.audit.id.is_some() && u.audit.id == id)
            .ok_or_else(|| IdentityError::UnknownUser(user.user_name.clone()))?;

        tracing::debug!(user_name = %created.user_name, id = ?created.audit.id, "Created user");
        Ok(created)
    }

    async fn add_to_role(&self, user: &User, role_name: &str) -> Result<()> {
        let user_id = Self::user_id(user)?;
        let wanted = normalize(role_name);
        let role = self
            .load::<Role>()
            .await?
            .into_iter()
            .find(|r| r.normalized_name == wanted)
            .ok_or_else(|| IdentityError::UnknownRole(role_name.to_string()))?;
        let role_id = role
            .audit
            .id
            .ok_or_else(|| IdentityError::UnknownRole(role_name.to_string()))?;

        let already = self
            .load::<UserRole>()
            .await?
            .iter()
            .any(|link| link.user_id == user_id && link.role_id == role_id);
        if already {
            return Ok(());
        }

        let link = UserRole::new(user_id, role_id, self.actor.clone());
        match self.commit(Change::Insert(record_of(&link)?)).await {
            Ok(_) => Ok(()),
            Err(IdentityError::Store(StoreError::ConstraintViolation { .. })) => {
                Err(IdentityError::UnknownUser(user.user_name.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn roles_of(&self, user: &User) -> Result<Vec<String>> {
        let user_id = Self::user_id(user)?;
        let role_ids: Vec<i64> = self
            .load::<UserRole>()
            .await?
            .into_iter()
            .filter(|link| link.user_id == user_id)
            .map(|link| link.role_id)
            .collect();

        let mut names: Vec<String> = self
            .load::<Role>()
            .await?
            .into_iter()
            .filter(|role| role.audit.id.is_some_and(|id| role_ids.contains(&id)))
            .map(|role| role.name)
            .collect();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for StoreUserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreUserManager")
            .field("policy", &self.policy)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}
