//! # ModSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The rate-limited, retrying platform API client and schema source
//! - The per-tenant credential store with token refresh
//! - In-memory and JSON-file schema persistence
//! - The auto-update scheduler
//! - Configuration loading and tracing setup
//! - [`context::SyncContext`], which wires all of the above together
//!
//! ## Architecture
//! - Implements traits defined in `modsync-core`
//! - Depends on `modsync-common`, `modsync-domain` and `modsync-core`
//! - Contains all "impure" code (HTTP, files, background tasks)

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod observability;
pub mod persistence;
pub mod scheduling;

// Re-export commonly used items
pub use api::{ApiError, HttpSchemaSource, ResilientHttpClient};
pub use auth::{CredentialStore, RefreshTokenError};
pub use context::SyncContext;
pub use errors::InfraError;
pub use observability::{init_tracing, LoggingRuleSink, NoopRuleSink, TracingEventSink};
pub use persistence::{FileSchemaStore, InMemorySchemaStore};
pub use scheduling::{AutoUpdateConfig, AutoUpdateScheduler, SchedulerError};
