//! Platform API access
//!
//! [`ResilientHttpClient`] wraps every outbound call in per-tenant rate
//! limiting, bounded connection accounting, a hard timeout, and retry with
//! exponential backoff. [`HttpSchemaSource`] adapts it to the core
//! `SchemaSource` port.

pub mod client;
pub mod errors;
pub mod schema_source;

pub use client::{Method, ResilientHttpClient, ResilientHttpClientBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use schema_source::HttpSchemaSource;
