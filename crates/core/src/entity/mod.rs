mod audit;
mod auth;
mod record;
mod traits;

pub use audit::{Audit, ConcurrencyToken, RowStatus};
pub use auth::{normalize, Role, User, UserRole};
pub use record::{Record, Row};
pub use traits::{Entity, ForeignKey, Referrer, UniqueKey};
