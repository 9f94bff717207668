//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `StoreError` from
//! `cachebound_core::storage`. Domain errors raised inside a connection
//! closure travel through `tokio_rusqlite::Error::Other` and come back out
//! unchanged.

use cachebound_core::storage::StoreError;

/// Maps a rusqlite error to a StoreError.
///
/// # Error Mapping
///
/// - Constraint failures → `StoreError::ConstraintViolation`
/// - Open/busy/locked failures → `StoreError::ConnectionFailed`
/// - All other errors → `StoreError::QueryFailed`
pub fn map_rusqlite_error(err: &rusqlite::Error, table: &'static str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation {
                table,
                constraint: err.to_string(),
            }
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            StoreError::ConnectionFailed(err.to_string())
        }

        rusqlite::Error::FromSqlConversionFailure(..) => StoreError::Serialization(err.to_string()),

        _ => StoreError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a StoreError.
///
/// This is the main entry point for error mapping in async code.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error, table: &'static str) -> StoreError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(&rusqlite_err, table),
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            StoreError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        tokio_rusqlite::Error::Other(other) => match other.downcast::<StoreError>() {
            Ok(store_err) => *store_err,
            Err(other) => StoreError::QueryFailed(other.to_string()),
        },
        other => StoreError::QueryFailed(other.to_string()),
    }
}

/// Wraps a domain error so it can leave a connection closure.
pub fn domain_err(err: StoreError) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(err))
}

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
pub fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}
