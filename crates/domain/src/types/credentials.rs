//! Per-tenant platform credentials

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access credentials for one tenant (portal/account)
///
/// Replaced wholesale on refresh; never mutated field by field outside the
/// credential store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub tenant_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credentials {
    /// Bearer-only credentials with no expiry or refresh token
    pub fn bearer(tenant_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    /// Check if the access token expires within `threshold` from now
    ///
    /// Credentials without an expiry never expire.
    pub fn is_expired(&self, threshold: Duration) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() + threshold >= expires_at)
    }

    /// Check whether a refresh is possible
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// Tokens are secrets; keep them out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}
