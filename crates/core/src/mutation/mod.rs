//! Sparse, schema-checked updates of single records.

pub mod executor;
pub mod patch;
pub mod schema;

pub use executor::PartialUpdateExecutor;
pub use patch::Patch;
pub use schema::{ChangeSet, Entity, EntityField};
