//! # ModSync Domain
//!
//! Business domain types and models for ModSync.
//!
//! This crate contains:
//! - Schema snapshot types (SchemaDefinition, FieldTypeDefinition, etc.)
//! - Diff, impact, migration-plan, and compatibility result types
//! - Credentials and synchronization records
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other ModSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
