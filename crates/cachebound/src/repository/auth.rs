use std::ops::Deref;
use std::sync::Arc;

use cachebound_core::entity::{normalize, User};
use cachebound_core::identity::UserManager;
use cachebound_core::storage::Result;

use super::Repository;

/// User repository plus the identity collaborator.
///
/// Derefs to [`Repository<User>`], so every generic query and staging
/// operation is available directly.
pub struct AuthRepository {
    users: Repository<User>,
    user_manager: Arc<dyn UserManager>,
}

impl AuthRepository {
    pub fn new(users: Repository<User>, user_manager: Arc<dyn UserManager>) -> Self {
        Self {
            users,
            user_manager,
        }
    }

    pub fn user_manager(&self) -> &Arc<dyn UserManager> {
        &self.user_manager
    }

    /// Looks a user up in the cached snapshot by normalized user name.
    pub async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>> {
        let wanted = normalize(user_name);
        self.users
            .find_one(move |u: &User| u.normalized_user_name == wanted)
            .await
    }

    /// Looks a user up in the cached snapshot by normalized email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let wanted = normalize(email);
        self.users
            .find_one(move |u: &User| u.normalized_email == wanted)
            .await
    }
}

impl Deref for AuthRepository {
    type Target = Repository<User>;

    fn deref(&self) -> &Self::Target {
        &self.users
    }
}

impl std::fmt::Debug for AuthRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRepository")
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}
