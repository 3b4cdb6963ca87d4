//! Shared helpers for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use modsync_domain::{ApiConfig, AuthConfig, Credentials, RetryConfig};
use modsync_infra::{CredentialStore, ResilientHttpClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TENANT: &str = "portal-1";
pub const TOKEN: &str = "test-access-token";

/// Retry settings with millisecond delays so tests stay fast
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig { max_retries, base_delay_ms: 5, max_delay_ms: 20, ..RetryConfig::default() }
}

pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig { base_url: server.uri(), ..ApiConfig::default() }
}

/// Credential store holding bearer credentials for [`TENANT`]
pub fn credential_store(auth: AuthConfig) -> Arc<CredentialStore> {
    let store = Arc::new(CredentialStore::new(auth).expect("credential store should build"));
    store.put(TENANT, Credentials::bearer(TENANT, TOKEN));
    store
}

pub fn client(api: ApiConfig, retry: RetryConfig) -> ResilientHttpClient {
    ResilientHttpClient::builder()
        .api(api)
        .retry(retry)
        .credentials(credential_store(AuthConfig::default()))
        .build()
        .expect("client should build")
}

/// Wire-format schema payload that passes structural validation
pub fn schema_json(version: &str, field_types: &[&str]) -> Value {
    let field_types: Vec<Value> = field_types
        .iter()
        .map(|t| json!({ "type": t, "requiredProperties": ["name", "label"] }))
        .collect();

    json!({
        "version": version,
        "lastUpdated": "2026-01-01T00:00:00Z",
        "fieldTypes": field_types,
        "contentTypes": ["SITE_PAGE", "LANDING_PAGE"],
        "moduleRequirements": {
            "minFields": 1,
            "maxFields": 50,
            "requiredFiles": ["module.html", "fields.json"],
            "maxFileSizeBytes": 1048576,
            "maxModuleSizeBytes": 10485760
        },
        "validationRules": [
            { "id": "label-required", "severity": "error", "description": "Fields need labels" }
        ]
    })
}
