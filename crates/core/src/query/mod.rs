//! In-memory selection over an entity snapshot.

mod plan;

pub use plan::{Direction, QueryPlan};
