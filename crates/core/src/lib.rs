//! # ModSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The schema diff engine (change detection, impact, migration planning,
//!   compatibility)
//! - Structural schema validation
//! - The schema sync service and the ports it drives
//!
//! ## Architecture Principles
//! - Only depends on `modsync-common` and `modsync-domain`
//! - No HTTP, file, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod schema;
pub mod sync;

pub use schema::{diff, diff_with_options, validate_schema, SchemaDiffEngine};
pub use sync::ports::{
    ChangeLogRepository, SchemaRepository, SchemaSource, SyncEventSink, ValidationRuleSink,
};
pub use sync::{SchemaSyncService, SyncError};
