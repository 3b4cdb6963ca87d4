//! Per-tenant credential management
//!
//! Credentials live in memory, keyed by tenant id. Refresh uses the OAuth 2.0
//! refresh-token grant against the configured token endpoint.

pub mod credential_store;

pub use credential_store::{CredentialStore, RefreshTokenError};
