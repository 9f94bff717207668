use thiserror::Error;

/// Errors raised by a [`Store`](super::Store) while loading or committing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Concurrency conflict on {table} row {id}: row was modified or deleted")]
    ConcurrencyConflict { table: &'static str, id: i64 },
    #[error("Constraint violation on {table}: {constraint}")]
    ConstraintViolation {
        table: &'static str,
        constraint: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors that can occur during repository operations.
///
/// Absence is never an error: lookups return `Option::None` or an empty `Vec`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
