//! Cache-backed repositories.
//!
//! [`Repository`] is generic over any [`Entity`]; the role and user-role
//! repositories are plain aliases of it, and [`AuthRepository`] adds the
//! identity collaborator on top of the user repository.
//!
//! [`Entity`]: cachebound_core::entity::Entity

mod auth;
mod base;
mod query;

#[cfg(test)]
mod contract;

pub use auth::AuthRepository;
pub use base::Repository;
pub use query::Query;

use cachebound_core::entity::{Role, UserRole};

pub type RoleRepository = Repository<Role>;
pub type UserRoleRepository = Repository<UserRole>;
