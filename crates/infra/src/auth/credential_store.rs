//! Credential store with refresh-token support
//!
//! Holds one [`Credentials`] value per tenant. [`CredentialStore::refresh`]
//! exchanges the stored refresh token for a new access token and replaces the
//! tenant's credentials wholesale. A failed refresh leaves the previous
//! credentials in place.
//!
//! The map entry is never held across the network call: refresh snapshots
//! the refresh token, performs the exchange, then writes the result.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use modsync_common::{ErrorClassification, ErrorSeverity};
use modsync_domain::{AuthConfig, Credentials, ModSyncError};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credential refresh failures
///
/// Whatever the variant, the tenant's prior credentials are untouched.
#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("No credentials stored for tenant {tenant_id}")]
    NoCredentials { tenant_id: String },

    #[error("No refresh token available for tenant {tenant_id}")]
    NoRefreshToken { tenant_id: String },

    #[error("Token refresh is not configured: {0}")]
    NotConfigured(String),

    #[error("Token endpoint rejected refresh with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token request failed: {0}")]
    Network(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl ErrorClassification for RefreshTokenError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(_) => ErrorSeverity::Warning,
            Self::Rejected { status, .. } if *status >= 500 => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

impl From<RefreshTokenError> for ModSyncError {
    fn from(err: RefreshTokenError) -> Self {
        ModSyncError::RefreshToken(err.to_string())
    }
}

/// OAuth 2.0 token endpoint response (RFC 6749 §5.1)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Per-tenant credential store
pub struct CredentialStore {
    credentials: DashMap<String, Credentials>,
    auth: AuthConfig,
    http: reqwest::Client,
}

impl CredentialStore {
    /// Create a store that refreshes against `auth.token_url`
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` if the HTTP client cannot be built
    pub fn new(auth: AuthConfig) -> Result<Self, RefreshTokenError> {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RefreshTokenError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self::with_http_client(auth, http))
    }

    /// Create a store using an existing HTTP client
    pub fn with_http_client(auth: AuthConfig, http: reqwest::Client) -> Self {
        Self { credentials: DashMap::new(), auth, http }
    }

    /// Store credentials for a tenant, replacing any existing ones
    pub fn put(&self, tenant_id: &str, credentials: Credentials) {
        debug!(tenant_id, "Storing credentials");
        self.credentials.insert(tenant_id.to_owned(), credentials);
    }

    pub fn get(&self, tenant_id: &str) -> Option<Credentials> {
        self.credentials.get(tenant_id).map(|entry| entry.value().clone())
    }

    /// Forget a tenant's credentials
    pub fn remove(&self, tenant_id: &str) -> Option<Credentials> {
        self.credentials.remove(tenant_id).map(|(_, credentials)| credentials)
    }

    /// Tenant ids with stored credentials, sorted
    pub fn tenants(&self) -> Vec<String> {
        let mut tenants: Vec<String> =
            self.credentials.iter().map(|entry| entry.key().clone()).collect();
        tenants.sort();
        tenants
    }

    /// Exchange the tenant's refresh token for new credentials
    ///
    /// On success the access token and expiry are replaced; the refresh token
    /// rotates only if the endpoint issued a new one, and scopes are replaced
    /// only if the response lists them.
    #[instrument(skip(self))]
    pub async fn refresh(&self, tenant_id: &str) -> Result<Credentials, RefreshTokenError> {
        let current = self
            .get(tenant_id)
            .ok_or_else(|| RefreshTokenError::NoCredentials { tenant_id: tenant_id.to_owned() })?;
        let refresh_token = current
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| RefreshTokenError::NoRefreshToken { tenant_id: tenant_id.to_owned() })?;
        let token_url = self
            .auth
            .token_url
            .as_deref()
            .ok_or_else(|| RefreshTokenError::NotConfigured("auth.token_url is not set".into()))?;

        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token),
        ];
        if let Some(client_id) = &self.auth.client_id {
            params.push(("client_id", client_id.clone()));
        }
        if let Some(secret) = &self.auth.client_secret {
            params.push(("client_secret", secret.clone()));
        }

        let response = self.http.post(token_url).form(&params).send().await.map_err(|e| {
            let domain: ModSyncError = InfraError::from(e).into();
            RefreshTokenError::Network(domain.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(tenant_id, status = status.as_u16(), "Token refresh rejected");
            return Err(RefreshTokenError::Rejected { status: status.as_u16(), body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshTokenError::InvalidResponse(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(RefreshTokenError::InvalidResponse("access_token is empty".into()));
        }

        let expires_at = token.expires_in.map(expiry_from_now).transpose()?;

        let refreshed = Credentials {
            tenant_id: current.tenant_id.clone(),
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()).or(current.refresh_token),
            expires_at,
            scopes: match token.scope {
                Some(scope) => scope.split_whitespace().map(str::to_owned).collect(),
                None => current.scopes,
            },
        };

        self.credentials.insert(tenant_id.to_owned(), refreshed.clone());
        info!(tenant_id, expires_at = ?refreshed.expires_at, "Credentials refreshed");

        Ok(refreshed)
    }
}

/// `expires_in` seconds from now, rejecting values the calendar cannot hold
fn expiry_from_now(secs: i64) -> Result<DateTime<Utc>, RefreshTokenError> {
    chrono::Duration::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| RefreshTokenError::InvalidResponse(format!("expires_in {secs} is out of range")))
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("tenants", &self.credentials.len())
            .field("auth", &self.auth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(AuthConfig::default()).unwrap()
    }

    #[test]
    fn test_put_get_remove() {
        let store = store();
        store.put("200", Credentials::bearer("200", "b"));
        store.put("100", Credentials::bearer("100", "a"));

        assert_eq!(store.get("100").unwrap().access_token, "a");
        assert_eq!(store.tenants(), vec!["100".to_string(), "200".to_string()]);

        assert!(store.remove("100").is_some());
        assert!(store.get("100").is_none());
        assert!(store.remove("100").is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_credentials() {
        let err = store().refresh("missing").await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::NoCredentials { .. }));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_keeps_credentials() {
        let store = store();
        store.put("123", Credentials::bearer("123", "access"));

        let err = store.refresh("123").await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::NoRefreshToken { .. }));
        assert_eq!(store.get("123").unwrap().access_token, "access");
    }

    #[tokio::test]
    async fn test_refresh_requires_token_url() {
        let store = store();
        store.put(
            "123",
            Credentials { refresh_token: Some("r".into()), ..Credentials::bearer("123", "a") },
        );

        let err = store.refresh("123").await.unwrap_err();
        assert!(matches!(err, RefreshTokenError::NotConfigured(_)));
    }

    #[test]
    fn test_classification_and_conversion() {
        assert!(RefreshTokenError::Network("reset".into()).is_retryable());
        assert!(RefreshTokenError::Rejected { status: 503, body: String::new() }.is_retryable());
        assert!(!RefreshTokenError::Rejected { status: 400, body: String::new() }.is_retryable());

        let err: ModSyncError = RefreshTokenError::NoRefreshToken { tenant_id: "1".into() }.into();
        assert!(matches!(err, ModSyncError::RefreshToken(_)));
    }
}
