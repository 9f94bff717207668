use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("user name '{0}' is already taken")]
    DuplicateUserName(String),

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("invalid user: {0}")]
    InvalidUser(String),

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;
