//! Schema and change-log storage adapters
//!
//! Both adapters implement the core `SchemaRepository` and
//! `ChangeLogRepository` ports:
//!
//! - [`InMemorySchemaStore`]: process-local, lost on restart
//! - [`FileSchemaStore`]: `current_schema.json` plus an append-only
//!   `schema_changelog.jsonl` in one directory

pub mod file;
pub mod memory;

pub use file::FileSchemaStore;
pub use memory::InMemorySchemaStore;
