//! SQL statement builders for the generic entity table layout.
//!
//! Table names are interpolated, so callers validate them with
//! [`is_valid_table_name`] first. Every value is a bound parameter.

/// Column list shared by every SELECT, in the order conversions expect.
pub const COLUMNS: &str = "id, external_id, created_by, created_at_utc, modified_by, \
     modified_at_utc, concurrency_token, row_status, payload";

/// Table names are plain lowercase identifiers.
pub fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !table.starts_with(|c: char| c.is_ascii_digit())
}

pub fn create_table(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    created_by TEXT NOT NULL,
    created_at_utc TEXT NOT NULL,
    modified_by TEXT,
    modified_at_utc TEXT,
    concurrency_token TEXT NOT NULL,
    row_status INTEGER NOT NULL DEFAULT 0,
    payload TEXT NOT NULL
)
"#
    )
}

pub fn select_all(table: &str) -> String {
    format!(r#"SELECT {COLUMNS} FROM "{table}" ORDER BY id ASC"#)
}

pub fn select_by_id(table: &str) -> String {
    format!(r#"SELECT {COLUMNS} FROM "{table}" WHERE id = ?1"#)
}

/// Next AUTOINCREMENT value for `?1`, so ids are never reused.
pub const NEXT_ID: &str = r#"
SELECT COALESCE((SELECT seq FROM sqlite_sequence WHERE name = ?1), 0) + 1
"#;

pub fn insert(table: &str) -> String {
    format!(
        r#"
INSERT INTO "{table}" (id, external_id, created_by, created_at_utc, concurrency_token, row_status, payload)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#
    )
}

/// Compare-and-swap update: matches zero rows when the token is stale.
pub fn update(table: &str) -> String {
    format!(
        r#"
UPDATE "{table}"
SET modified_by = ?3, modified_at_utc = ?4, concurrency_token = ?5, row_status = ?6, payload = ?7
WHERE id = ?1 AND concurrency_token = ?2
"#
    )
}

/// Deletes by id, checking the token only when one is given.
pub fn delete(table: &str) -> String {
    format!(
        r#"
DELETE FROM "{table}"
WHERE id = ?1 AND (?2 IS NULL OR concurrency_token = ?2)
"#
    )
}

pub fn exists_by_id(table: &str) -> String {
    format!(r#"SELECT EXISTS(SELECT 1 FROM "{table}" WHERE id = ?1)"#)
}

/// Another row holds the same value at JSON path `?1`.
pub fn exists_unique_value(table: &str) -> String {
    format!(
        r#"SELECT EXISTS(SELECT 1 FROM "{table}" WHERE json_extract(payload, ?1) = ?2 AND (?3 IS NULL OR id != ?3))"#
    )
}

/// Some row points at id `?2` through JSON path `?1`.
pub fn exists_reference(table: &str) -> String {
    format!(r#"SELECT EXISTS(SELECT 1 FROM "{table}" WHERE json_extract(payload, ?1) = ?2)"#)
}

/// JSON path of a top-level payload field.
pub fn json_path(column: &str) -> String {
    format!("$.{column}")
}
