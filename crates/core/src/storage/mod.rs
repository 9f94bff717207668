mod change;
mod error;
mod http_mapping;
mod traits;

pub use change::{insert_audit, update_audit, Change, CommitReport, InsertedKey};
pub use error::{RepositoryError, Result, StoreError, StoreResult};
pub use http_mapping::repository_error_to_status_code;
pub use traits::Store;
