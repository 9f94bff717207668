//! SQLite storage backend implementation.
//!
//! Every entity table shares one generic layout: the audit columns as real
//! columns plus the serialized entity in a JSON `payload` column. Unique
//! and foreign-key rules are checked with `json_extract` inside the commit
//! transaction.

mod conversions;
mod error;
mod schema;
mod store;

pub use store::SqliteStore;
