//! Contract for the identity collaborator exposed by the auth repository.

mod error;
mod functions;
mod traits;

pub use error::{IdentityError, Result};
pub use functions::{ensure_unique_user, validate_user};
pub use traits::UserManager;
