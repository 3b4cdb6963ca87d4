//! Rate-limited platform API client with retry and connection accounting
//!
//! Every call goes through the same loop:
//!
//! 1. Resolve the tenant's bearer token from the [`CredentialStore`]
//! 2. Take a rate-limit permit for the tenant (may suspend)
//! 3. Take a connection slot (released when the attempt finishes, however it
//!    finishes)
//! 4. Send with a hard timeout and feed `X-RateLimit-*` headers back into the
//!    limiter
//! 5. On a retryable status or a network failure, sleep the backoff delay
//!    and go back to 2
//!
//! Total attempts are `1 + max_retries`. Rate-limit exhaustion is never
//! surfaced; callers wait inside step 2.

use std::sync::Arc;
use std::time::Duration;

use modsync_common::{
    BackoffStrategy, Clock, ConnectionPool, ConnectionPoolConfig, PoolMetrics, RateLimitStatus,
    RateLimiterConfig, SystemClock, TenantRateLimiter,
};
use modsync_domain::constants::{HEADER_RATE_LIMIT_REMAINING, HEADER_RATE_LIMIT_RESET};
use modsync_domain::{ApiConfig, RateLimitConfig, RetryConfig};
pub use reqwest::Method;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use crate::auth::CredentialStore;

/// Refresh tokens that expire within this many seconds
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Reset values at or above this are epoch milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;
/// Reset values at or above this (and below the millis threshold) are epoch
/// seconds; anything smaller is seconds from now
const EPOCH_SECONDS_THRESHOLD: f64 = 1e9;

/// Platform API client with per-tenant rate limiting and retries
pub struct ResilientHttpClient {
    http: reqwest::Client,
    api: ApiConfig,
    retry: RetryConfig,
    backoff: BackoffStrategy,
    timeout: Duration,
    credentials: Arc<CredentialStore>,
    rate_limiter: Arc<TenantRateLimiter>,
    pool: ConnectionPool,
}

impl ResilientHttpClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ResilientHttpClientBuilder {
        ResilientHttpClientBuilder::default()
    }

    /// Issue a request and return the JSON body
    ///
    /// An empty body (including 204) is returned as `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `Authentication` if no credentials are stored for `tenant_id`
    /// - `Transport` for a non-retryable status, or once retries are exhausted
    /// - `Network` / `Timeout` once retries are exhausted
    /// - `Decode` if a 2xx body is not valid JSON
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        tenant_id: &str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let token = self.resolve_token(tenant_id).await?;
        let url = self.url(path);
        let max_retries = self.retry.max_retries;
        let mut attempt: u32 = 0;

        loop {
            let _permit = self.rate_limiter.acquire(tenant_id).await;

            let err = match self.send_once(tenant_id, &method, &url, &token, body, attempt).await {
                Ok(value) => {
                    debug!(attempts = attempt + 1, "Request succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt >= max_retries || !self.should_retry(&err) {
                warn!(attempts = attempt + 1, error = %err, "Request failed");
                return Err(err);
            }

            let delay = self.backoff.calculate_delay(attempt);
            debug!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying after backoff"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    /// Execute a GET request and deserialize the response
    pub async fn get<T: DeserializeOwned>(&self, tenant_id: &str, path: &str) -> Result<T, ApiError> {
        let value = self.request(tenant_id, Method::GET, path, None).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Execute a POST request with a JSON body and deserialize the response
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        tenant_id: &str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        let value = self.request(tenant_id, Method::POST, path, Some(&body)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// In-flight requests
    pub fn active_connections(&self) -> usize {
        self.pool.active_connections()
    }

    pub fn pool_metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    pub fn rate_limiter(&self) -> &Arc<TenantRateLimiter> {
        &self.rate_limiter
    }

    pub fn rate_limit_status(&self, tenant_id: &str) -> Option<RateLimitStatus> {
        self.rate_limiter.status(tenant_id)
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Current access token, refreshed first if it is about to expire
    ///
    /// A failed refresh is logged and the existing token is used; the server
    /// decides whether it is still acceptable.
    async fn resolve_token(&self, tenant_id: &str) -> Result<String, ApiError> {
        let credentials = self.credentials.get(tenant_id).ok_or_else(|| {
            ApiError::Authentication(format!("no credentials for tenant {tenant_id}"))
        })?;

        if credentials.is_expired(chrono::Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS))
            && credentials.can_refresh()
        {
            match self.credentials.refresh(tenant_id).await {
                Ok(refreshed) => return Ok(refreshed.access_token),
                Err(err) => warn!(error = %err, "Credential refresh failed, using existing token"),
            }
        }

        Ok(credentials.access_token)
    }

    /// `{base_url}/{api_version}{path}` with exactly one `/` at each join
    fn url(&self, path: &str) -> String {
        let base = self.api.base_url.trim_end_matches('/');
        let version = self.api.api_version.trim_matches('/');
        let path = path.trim_start_matches('/');
        if version.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{version}/{path}")
        }
    }

    fn should_retry(&self, err: &ApiError) -> bool {
        match err {
            ApiError::Transport { status, .. } => self.retry.is_retryable_status(*status),
            ApiError::Network(_) | ApiError::Timeout(_) => true,
            _ => false,
        }
    }

    /// One attempt, holding a connection slot for its whole duration
    async fn send_once(
        &self,
        tenant_id: &str,
        method: &Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<Value, ApiError> {
        let _slot = self.pool.acquire().await?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(attempt = attempt + 1, %url, "Sending request");

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, headers, bytes))
        };

        let (status, headers, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(parts)) => parts,
            Ok(Err(err)) if err.is_timeout() => return Err(ApiError::Timeout(self.timeout)),
            Ok(Err(err)) => return Err(ApiError::Network(err.to_string())),
            Err(_) => return Err(ApiError::Timeout(self.timeout)),
        };

        self.apply_rate_limit_headers(tenant_id, &headers);
        debug!(attempt = attempt + 1, status = status.as_u16(), "Received response");

        if !status.is_success() {
            return Err(ApiError::Transport {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn apply_rate_limit_headers(&self, tenant_id: &str, headers: &HeaderMap) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

        let remaining = header(HEADER_RATE_LIMIT_REMAINING).and_then(|v| v.parse::<u32>().ok());
        let reset_at_ms = header(HEADER_RATE_LIMIT_RESET)
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(|v| reset_to_epoch_millis(v, SystemClock.millis_since_epoch()));

        self.rate_limiter.update_from_response(tenant_id, remaining, reset_at_ms);
    }
}

/// Interpret an `X-RateLimit-Reset` value on the epoch-millisecond timeline
fn reset_to_epoch_millis(value: f64, now_ms: u64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = if value >= EPOCH_MILLIS_THRESHOLD {
        value
    } else if value >= EPOCH_SECONDS_THRESHOLD {
        value * 1_000.0
    } else {
        now_ms as f64 + value * 1_000.0
    };
    Some(millis as u64)
}

impl std::fmt::Debug for ResilientHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientHttpClient")
            .field("base_url", &self.api.base_url)
            .field("api_version", &self.api.api_version)
            .field("max_retries", &self.retry.max_retries)
            .field("active_connections", &self.pool.active_connections())
            .finish()
    }
}

/// Builder for [`ResilientHttpClient`]
#[derive(Default)]
pub struct ResilientHttpClientBuilder {
    api: Option<ApiConfig>,
    retry: Option<RetryConfig>,
    rate_limit: Option<RateLimitConfig>,
    rate_limiter: Option<Arc<TenantRateLimiter>>,
    credentials: Option<Arc<CredentialStore>>,
}

impl ResilientHttpClientBuilder {
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = Some(api);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Limits for a limiter the builder creates itself
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Share an existing limiter (takes precedence over [`Self::rate_limit`])
    pub fn rate_limiter(mut self, limiter: Arc<TenantRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `Config` if the credential store is missing, the base URL is
    /// empty, or a component rejects its settings
    pub fn build(self) -> Result<ResilientHttpClient, ApiError> {
        let api = self.api.unwrap_or_default();
        let retry = self.retry.unwrap_or_default();
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::Config("Credential store not set".to_string()))?;

        if api.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        if api.timeout_ms == 0 {
            return Err(ApiError::Config("timeout_ms must be greater than 0".to_string()));
        }

        let rate_limiter = match self.rate_limiter {
            Some(limiter) => limiter,
            None => {
                let limits = self.rate_limit.unwrap_or_default();
                let config =
                    RateLimiterConfig::per_second(limits.requests_per_second, limits.burst_limit);
                Arc::new(TenantRateLimiter::new(config).map_err(ApiError::Config)?)
            }
        };

        let pool = ConnectionPool::new(ConnectionPoolConfig {
            max_connections: api.max_connections,
            acquire_timeout: None,
        })
        .map_err(ApiError::Config)?;

        let timeout = Duration::from_millis(api.timeout_ms);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(api.max_connections)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        let backoff =
            BackoffStrategy::exponential(retry.base_delay_ms, retry.backoff_factor, retry.max_delay_ms);

        info!(
            base_url = %api.base_url,
            api_version = %api.api_version,
            max_connections = api.max_connections,
            max_retries = retry.max_retries,
            "Platform API client configured"
        );

        Ok(ResilientHttpClient {
            http,
            api,
            retry,
            backoff,
            timeout,
            credentials,
            rate_limiter,
            pool,
        })
    }
}
