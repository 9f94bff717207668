use async_trait::async_trait;

use crate::entity::User;

use super::Result;

/// Identity collaborator: user lookup, creation and role membership.
///
/// Lookups compare normalized values, so `find_by_email("Bob@Example.com")`
/// finds a user registered as `bob@example.com`.
#[async_trait]
pub trait UserManager: Send + Sync {
    /// Finds a user by user name.
    async fn find_by_name(&self, user_name: &str) -> Result<Option<User>>;

    /// Finds a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persists a new user and returns it with store-assigned fields.
    async fn create(&self, user: User) -> Result<User>;

    /// Assigns an existing role to a persisted user. Assigning a role the
    /// user already has is a no-op.
    async fn add_to_role(&self, user: &User, role_name: &str) -> Result<()>;

    /// Names of the roles assigned to a user, sorted.
    async fn roles_of(&self, user: &User) -> Result<Vec<String>>;
}
