//! Schema diff engine and structural validation
//!
//! Everything in this module is pure: no I/O, no clocks beyond id
//! generation, no shared state. The sync service calls in here between
//! fetching a schema and persisting it.

pub mod compatibility;
pub mod diff;
pub mod impact;
pub mod migration;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use diff::{diff, diff_with_options, SchemaDiffEngine};
pub use validation::{validate_schema, validate_upgrade, SchemaValidationIssue};
