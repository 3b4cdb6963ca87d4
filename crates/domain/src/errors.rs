//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ModSync
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ModSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Only produced internally; callers wait instead of seeing it
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Schema update already in progress")]
    ConcurrentUpdate,

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Credential refresh failed: {0}")]
    RefreshToken(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ModSync operations
pub type Result<T> = std::result::Result<T, ModSyncError>;
