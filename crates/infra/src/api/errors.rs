//! API-specific error types
//!
//! Provides error classification for platform API operations with retry
//! metadata.

use std::time::Duration;

use modsync_common::{ErrorClassification, ErrorSeverity, PoolError};
use modsync_domain::ModSyncError;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Missing or rejected credentials (401, 403) - never retried
    Authentication,
    /// Rate limiting (429) - retried with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth and rate limit) - non-retryable
    Client,
    /// Network/connection errors and timeouts - retryable
    Network,
    /// Malformed response or request body - non-retryable
    Payload,
    /// Configuration errors - non-retryable
    Config,
}

/// Platform API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-2xx response, returned once retries are exhausted or for a
    /// status outside the retryable set
    #[error("Request failed with status {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Authentication(_) => ApiErrorCategory::Authentication,
            Self::Transport { status, .. } => match *status {
                401 | 403 => ApiErrorCategory::Authentication,
                429 => ApiErrorCategory::RateLimit,
                500..=599 => ApiErrorCategory::Server,
                _ => ApiErrorCategory::Client,
            },
            Self::Network(_) | Self::Timeout(_) | Self::Pool(_) => ApiErrorCategory::Network,
            Self::Decode(_) | Self::Encode(_) => ApiErrorCategory::Payload,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status of a transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::RateLimit | ApiErrorCategory::Network => ErrorSeverity::Warning,
            ApiErrorCategory::Server | ApiErrorCategory::Client | ApiErrorCategory::Payload => {
                ErrorSeverity::Error
            }
            ApiErrorCategory::Authentication | ApiErrorCategory::Config => ErrorSeverity::Critical,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self.category() {
            ApiErrorCategory::RateLimit => Some(Duration::from_secs(1)),
            ApiErrorCategory::Server => Some(Duration::from_secs(10)),
            ApiErrorCategory::Network => Some(Duration::from_secs(5)),
            _ => None,
        }
    }
}

impl From<ApiError> for ModSyncError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::Authentication => ModSyncError::Auth(message),
            ApiErrorCategory::Network => ModSyncError::Network(message),
            ApiErrorCategory::Config => ModSyncError::Config(message),
            ApiErrorCategory::Payload => ModSyncError::InvalidInput(message),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Client => {
                ModSyncError::Transport(message)
            }
        }
    }
}
