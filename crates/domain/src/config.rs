//! Configuration structures
//!
//! Every section carries `#[serde(default)]` so a partial TOML or JSON file
//! loads with defaults filled in. Loading itself lives in
//! `modsync_infra::config`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_RETRY_STATUS_CODES, DEFAULT_SCHEMA_PATH, DEFAULT_STORAGE_DIR,
};
use crate::{ModSyncError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryConfig,
    pub auth: AuthConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject settings the client cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ModSyncError::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.timeout_ms == 0 {
            return Err(ModSyncError::Config("api.timeout_ms must be greater than 0".to_string()));
        }
        if self.api.max_connections == 0 {
            return Err(ModSyncError::Config(
                "api.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.requests_per_second == 0 {
            return Err(ModSyncError::Config(
                "rate_limit.requests_per_second must be greater than 0".to_string(),
            ));
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(ModSyncError::Config(format!(
                "retry.backoff_factor must be at least 1.0, got {}",
                self.retry.backoff_factor
            )));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ModSyncError::Config(
                "retry.max_delay_ms must not be below retry.base_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform API endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout_ms: u64,
    pub max_connections: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_ms: 30_000,
            max_connections: 10,
        }
    }
}

/// Per-tenant rate limit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests_per_second: 10, burst_limit: 5 }
    }
}

/// Retry and backoff settings for transient failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.to_vec(),
        }
    }
}

impl RetryConfig {
    /// Check whether an HTTP status is in the retryable set
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

/// Token refresh endpoint and client credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Schema synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Tenant whose credentials are used to fetch the schema
    pub tenant_id: String,
    pub schema_path: String,
    /// Directory for the file-backed schema store (in-memory when `None`)
    pub storage_dir: Option<String>,
    /// Auto-update period; disabled when `None`
    pub auto_update_interval_hours: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            schema_path: DEFAULT_SCHEMA_PATH.to_string(),
            storage_dir: Some(DEFAULT_STORAGE_DIR.to_string()),
            auto_update_interval_hours: None,
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
