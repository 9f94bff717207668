//! Synchronous facade over the unit of work.
//!
//! Each call blocks the current thread on an owned Tokio runtime. These types
//! must not be used from inside an async context: blocking on a runtime from
//! within another one panics.

use std::io;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use cachebound_core::entity::{Entity, Role, User, UserRole};
use cachebound_core::storage::{CommitReport, Result};

use crate::repository::Repository;
use crate::wrapper::{RepositoryWrapper, RepositoryWrapperFactory};

/// Blocking counterpart of [`RepositoryWrapper`].
pub struct BlockingRepositoryWrapper {
    runtime: Arc<Runtime>,
    inner: RepositoryWrapper,
}

impl BlockingRepositoryWrapper {
    /// Starts a unit of work on a fresh current-thread runtime.
    pub fn new(factory: &RepositoryWrapperFactory) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self::with_runtime(factory, Arc::new(runtime)))
    }

    /// Starts a unit of work on an existing runtime.
    ///
    /// Backends that spawn tasks (the Redis connection manager) must have
    /// been created on this same runtime.
    pub fn with_runtime(factory: &RepositoryWrapperFactory, runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            inner: factory.begin(),
        }
    }

    pub fn users(&self) -> BlockingRepository<'_, User> {
        let users: &Repository<User> = self.inner.auth();
        self.repository(users)
    }

    pub fn roles(&self) -> BlockingRepository<'_, Role> {
        self.repository(self.inner.roles())
    }

    pub fn user_roles(&self) -> BlockingRepository<'_, UserRole> {
        self.repository(self.inner.user_roles())
    }

    pub fn find_user_by_name(&self, user_name: &str) -> Result<Option<User>> {
        self.runtime.block_on(self.inner.auth().find_by_user_name(user_name))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.runtime.block_on(self.inner.auth().find_by_email(email))
    }

    pub fn pending_changes(&self) -> usize {
        self.inner.pending_changes()
    }

    pub fn rollback(&self) -> usize {
        self.inner.rollback()
    }

    pub fn commit(&self) -> Result<CommitReport> {
        self.runtime.block_on(self.inner.commit())
    }

    fn repository<'w, T: Entity>(&'w self, repository: &'w Repository<T>) -> BlockingRepository<'w, T> {
        BlockingRepository {
            runtime: &self.runtime,
            repository,
        }
    }
}

impl std::fmt::Debug for BlockingRepositoryWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRepositoryWrapper")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Blocking view of one repository of a [`BlockingRepositoryWrapper`].
pub struct BlockingRepository<'w, T: Entity> {
    runtime: &'w Runtime,
    repository: &'w Repository<T>,
}

impl<T: Entity> BlockingRepository<'_, T> {
    pub fn add(&self, entity: &T) -> Result<()> {
        self.repository.add(entity)
    }

    pub fn add_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.repository.add_many(entities)
    }

    pub fn remove(&self, entity: &T) -> Result<()> {
        self.repository.remove(entity)
    }

    pub fn remove_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.repository.remove_many(entities)
    }

    pub fn update(&self, entity: &T) -> Result<()> {
        self.repository.update(entity)
    }

    pub fn update_many<'a, I>(&self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.repository.update_many(entities)
    }

    pub fn find_one<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.runtime.block_on(self.repository.find_one(predicate))
    }

    pub fn find_one_ordered_desc<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_one_ordered_desc(predicate, key))
    }

    pub fn find_last<K, F>(&self, key: F) -> Result<Option<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime.block_on(self.repository.find_last(key))
    }

    pub fn find_last_where<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_last_where(predicate, key))
    }

    pub fn find_last_desc<K, F>(&self, key: F) -> Result<Option<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime.block_on(self.repository.find_last_desc(key))
    }

    pub fn find_last_desc_where<P, K, F>(&self, predicate: P, key: F) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_last_desc_where(predicate, key))
    }

    pub fn find_all(&self) -> Result<Vec<T>> {
        self.runtime.block_on(self.repository.find_all())
    }

    pub fn find_all_where<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.runtime.block_on(self.repository.find_all_where(predicate))
    }

    pub fn find_all_ordered<K, F>(&self, key: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime.block_on(self.repository.find_all_ordered(key))
    }

    pub fn find_all_where_ordered<P, K, F>(&self, predicate: P, key: F) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_all_where_ordered(predicate, key))
    }

    pub fn find_all_desc(&self) -> Result<Vec<T>> {
        self.runtime.block_on(self.repository.find_all_desc())
    }

    pub fn find_all_desc_where<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.runtime
            .block_on(self.repository.find_all_desc_where(predicate))
    }

    pub fn find_all_desc_ordered<K, F>(&self, key: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_all_desc_ordered(key))
    }

    pub fn find_all_desc_where_ordered<P, K, F>(&self, predicate: P, key: F) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.runtime
            .block_on(self.repository.find_all_desc_where_ordered(predicate, key))
    }
}
