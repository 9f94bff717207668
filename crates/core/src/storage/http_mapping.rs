//! Pure functions for mapping repository errors to HTTP status codes.
//!
//! Hosting is outside this workspace; the mapping lives here so any HTTP
//! layer built on top reports errors consistently.

use super::{RepositoryError, StoreError};

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `InvalidArgument` -> 400 (Bad Request)
/// - `ConcurrencyConflict` -> 409 (Conflict)
/// - `ConstraintViolation` -> 422 (Unprocessable Entity)
/// - `Cancelled` -> 499 (Client Closed Request)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - everything else -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use cachebound_core::storage::{repository_error_to_status_code, RepositoryError, StoreError};
///
/// let error = RepositoryError::Store(StoreError::ConcurrencyConflict { table: "roles", id: 1 });
/// assert_eq!(repository_error_to_status_code(&error), 409);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::InvalidArgument(_) => 400,
        RepositoryError::Cancelled => 499,
        RepositoryError::Serialization(_) => 500,
        RepositoryError::Store(store) => store_error_to_status_code(store),
    }
}

fn store_error_to_status_code(error: &StoreError) -> u16 {
    match error {
        StoreError::ConcurrencyConflict { .. } => 409,
        StoreError::ConstraintViolation { .. } => 422,
        StoreError::ConnectionFailed(_) => 503,
        StoreError::QueryFailed(_) | StoreError::Serialization(_) => 500,
    }
}
