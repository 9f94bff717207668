//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and stored entity rows.
//! These are testable in isolation without database access.

use cachebound_core::entity::{Audit, ConcurrencyToken, Row, RowStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Convert a SQLite row to a stored entity row.
///
/// Expected columns: see [`super::schema::COLUMNS`].
pub fn sql_row_to_row(row: &rusqlite::Row) -> rusqlite::Result<Row> {
    let id: i64 = row.get(0)?;
    let external_id: String = row.get(1)?;
    let created_by: String = row.get(2)?;
    let created_at_utc: String = row.get(3)?;
    let modified_by: Option<String> = row.get(4)?;
    let modified_at_utc: Option<String> = row.get(5)?;
    let concurrency_token: String = row.get(6)?;
    let row_status: i16 = row.get(7)?;
    let payload: String = row.get(8)?;

    Ok(Row {
        audit: Audit {
            id: Some(id),
            external_id: Some(parse_uuid(1, &external_id)?),
            created_by,
            created_at_utc: Some(parse_datetime(3, &created_at_utc)?),
            modified_by,
            modified_at_utc: modified_at_utc
                .as_deref()
                .map(|s| parse_datetime(5, s))
                .transpose()?,
            concurrency_token: Some(ConcurrencyToken::from_uuid(parse_uuid(
                6,
                &concurrency_token,
            )?)),
            row_status: RowStatus(row_status),
        },
        payload: serde_json::from_str(&payload).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

/// Parse a UUID from string.
fn parse_uuid(column: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(column: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Format a DateTime for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Format an optional concurrency token for a bound parameter.
pub fn format_token(token: Option<ConcurrencyToken>) -> Option<String> {
    token.map(|t| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let formatted = format_datetime(&dt);

        assert_eq!(parse_datetime(0, &formatted).unwrap(), dt);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime(3, "yesterday").is_err());
    }

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        assert!(parse_uuid(1, "not-a-uuid").is_err());
    }

    #[test]
    fn test_format_token() {
        let token = ConcurrencyToken::generate();

        assert_eq!(format_token(Some(token)), Some(token.as_uuid().to_string()));
        assert_eq!(format_token(None), None);
    }
}
