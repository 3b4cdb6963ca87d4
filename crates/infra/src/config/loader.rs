//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Read a `.env` file into the process environment when one exists
//! 2. Attempt to load from `MODSYNC_*` environment variables
//! 3. If the required variables are missing, fall back to a config file
//! 4. Probe multiple paths for config files (JSON or TOML by extension)
//! 5. Validate whichever configuration was loaded
//!
//! ## Environment Variables
//! Required: `MODSYNC_BASE_URL`, `MODSYNC_SYNC_TENANT`.
//!
//! Optional (defaults otherwise): `MODSYNC_API_VERSION`,
//! `MODSYNC_TIMEOUT_MS`, `MODSYNC_MAX_CONNECTIONS`,
//! `MODSYNC_RATE_LIMIT_RPS`, `MODSYNC_RATE_LIMIT_BURST`,
//! `MODSYNC_MAX_RETRIES`, `MODSYNC_BACKOFF_FACTOR`, `MODSYNC_SCHEMA_PATH`,
//! `MODSYNC_STORAGE_DIR`, `MODSYNC_AUTO_UPDATE_HOURS`, `MODSYNC_TOKEN_URL`,
//! `MODSYNC_CLIENT_ID`, `MODSYNC_CLIENT_SECRET`, `MODSYNC_LOG_LEVEL`,
//! `MODSYNC_LOG_JSON`.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./modsync.{toml,json}` then `./config.{toml,json}`
//! 2. The same names in `../` and `../../`
//! 3. The same names next to the executable

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use modsync_domain::{Config, ModSyncError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["modsync.toml", "modsync.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ModSyncError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ModSyncError::Config` if a required variable is missing, an
/// optional one has an invalid value, or validation fails.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("MODSYNC_BASE_URL")?;
    config.sync.tenant_id = env_var("MODSYNC_SYNC_TENANT")?;

    if let Some(version) = env_opt("MODSYNC_API_VERSION") {
        config.api.api_version = version;
    }
    if let Some(timeout_ms) = env_parse("MODSYNC_TIMEOUT_MS")? {
        config.api.timeout_ms = timeout_ms;
    }
    if let Some(max_connections) = env_parse("MODSYNC_MAX_CONNECTIONS")? {
        config.api.max_connections = max_connections;
    }

    if let Some(rps) = env_parse("MODSYNC_RATE_LIMIT_RPS")? {
        config.rate_limit.requests_per_second = rps;
    }
    if let Some(burst) = env_parse("MODSYNC_RATE_LIMIT_BURST")? {
        config.rate_limit.burst_limit = burst;
    }

    if let Some(max_retries) = env_parse("MODSYNC_MAX_RETRIES")? {
        config.retry.max_retries = max_retries;
    }
    if let Some(factor) = env_parse("MODSYNC_BACKOFF_FACTOR")? {
        config.retry.backoff_factor = factor;
    }

    if let Some(schema_path) = env_opt("MODSYNC_SCHEMA_PATH") {
        config.sync.schema_path = schema_path;
    }
    if let Some(storage_dir) = env_opt("MODSYNC_STORAGE_DIR") {
        config.sync.storage_dir = Some(storage_dir);
    }
    config.sync.auto_update_interval_hours = env_parse("MODSYNC_AUTO_UPDATE_HOURS")?;

    config.auth.token_url = env_opt("MODSYNC_TOKEN_URL");
    config.auth.client_id = env_opt("MODSYNC_CLIENT_ID");
    config.auth.client_secret = env_opt("MODSYNC_CLIENT_SECRET");

    if let Some(level) = env_opt("MODSYNC_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("MODSYNC_LOG_JSON", false);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations via
/// [`probe_config_paths`].
///
/// # Errors
/// Returns `ModSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ModSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ModSyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ModSyncError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ModSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ModSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ModSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        ModSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Get optional environment variable; empty counts as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ModSyncError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::Builder;

    use super::*;

    const ALL_VARS: [&str; 17] = [
        "MODSYNC_BASE_URL",
        "MODSYNC_API_VERSION",
        "MODSYNC_TIMEOUT_MS",
        "MODSYNC_MAX_CONNECTIONS",
        "MODSYNC_RATE_LIMIT_RPS",
        "MODSYNC_RATE_LIMIT_BURST",
        "MODSYNC_MAX_RETRIES",
        "MODSYNC_BACKOFF_FACTOR",
        "MODSYNC_SYNC_TENANT",
        "MODSYNC_SCHEMA_PATH",
        "MODSYNC_STORAGE_DIR",
        "MODSYNC_AUTO_UPDATE_HOURS",
        "MODSYNC_TOKEN_URL",
        "MODSYNC_CLIENT_ID",
        "MODSYNC_CLIENT_SECRET",
        "MODSYNC_LOG_LEVEL",
        "MODSYNC_LOG_JSON",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_env_bool_parsing() {
        for (value, expected) in [("1", true), ("TRUE", true), ("yes", true), ("on", true), ("0", false), ("off", false)] {
            std::env::set_var("MODSYNC_TEST_BOOL", value);
            assert_eq!(env_bool("MODSYNC_TEST_BOOL", !expected), expected, "{value}");
        }

        std::env::remove_var("MODSYNC_TEST_BOOL");
        assert!(env_bool("MODSYNC_TEST_BOOL", true));
        assert!(!env_bool("MODSYNC_TEST_BOOL", false));
    }

    #[test]
    #[serial]
    fn test_load_from_env_required_only() {
        clear_env();
        std::env::set_var("MODSYNC_BASE_URL", "https://api.example.com");
        std::env::set_var("MODSYNC_SYNC_TENANT", "portal-1");

        let config = load_from_env().unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.sync.tenant_id, "portal-1");
        assert_eq!(config.api.api_version, "v3");
        assert_eq!(config.rate_limit.requests_per_second, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.auth.client_secret.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_all_vars_set() {
        clear_env();
        std::env::set_var("MODSYNC_BASE_URL", "https://api.example.com");
        std::env::set_var("MODSYNC_SYNC_TENANT", "portal-1");
        std::env::set_var("MODSYNC_API_VERSION", "v4");
        std::env::set_var("MODSYNC_TIMEOUT_MS", "5000");
        std::env::set_var("MODSYNC_MAX_CONNECTIONS", "4");
        std::env::set_var("MODSYNC_RATE_LIMIT_RPS", "20");
        std::env::set_var("MODSYNC_RATE_LIMIT_BURST", "2");
        std::env::set_var("MODSYNC_MAX_RETRIES", "5");
        std::env::set_var("MODSYNC_BACKOFF_FACTOR", "1.5");
        std::env::set_var("MODSYNC_SCHEMA_PATH", "/schema");
        std::env::set_var("MODSYNC_STORAGE_DIR", "/var/lib/modsync");
        std::env::set_var("MODSYNC_AUTO_UPDATE_HOURS", "24");
        std::env::set_var("MODSYNC_TOKEN_URL", "https://auth.example.com/token");
        std::env::set_var("MODSYNC_CLIENT_ID", "client");
        std::env::set_var("MODSYNC_CLIENT_SECRET", "secret");
        std::env::set_var("MODSYNC_LOG_LEVEL", "debug");
        std::env::set_var("MODSYNC_LOG_JSON", "true");

        let config = load_from_env().unwrap();

        assert_eq!(config.api.api_version, "v4");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.api.max_connections, 4);
        assert_eq!(config.rate_limit.requests_per_second, 20);
        assert_eq!(config.rate_limit.burst_limit, 2);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff_factor, 1.5);
        assert_eq!(config.sync.schema_path, "/schema");
        assert_eq!(config.sync.storage_dir.as_deref(), Some("/var/lib/modsync"));
        assert_eq!(config.sync.auto_update_interval_hours, Some(24));
        assert_eq!(config.auth.token_url.as_deref(), Some("https://auth.example.com/token"));
        assert_eq!(config.auth.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_missing_var() {
        clear_env();
        std::env::set_var("MODSYNC_BASE_URL", "https://api.example.com");

        let err = load_from_env().unwrap_err();
        match err {
            ModSyncError::Config(message) => assert!(message.contains("MODSYNC_SYNC_TENANT")),
            other => panic!("expected config error, got {other:?}"),
        }

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_invalid_number() {
        clear_env();
        std::env::set_var("MODSYNC_BASE_URL", "https://api.example.com");
        std::env::set_var("MODSYNC_SYNC_TENANT", "portal-1");
        std::env::set_var("MODSYNC_TIMEOUT_MS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ModSyncError::Config(_)));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_rejects_invalid_values() {
        clear_env();
        std::env::set_var("MODSYNC_BASE_URL", "https://api.example.com");
        std::env::set_var("MODSYNC_SYNC_TENANT", "portal-1");
        std::env::set_var("MODSYNC_RATE_LIMIT_RPS", "0");

        assert!(matches!(load_from_env(), Err(ModSyncError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml_partial() {
        let file = write_config(
            ".toml",
            r#"
[api]
base_url = "https://api.example.com"

[sync]
tenant_id = "portal-1"
auto_update_interval_hours = 6

[retry]
max_retries = 1
"#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.sync.auto_update_interval_hours, Some(6));
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.retry_status_codes, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn test_load_from_file_json() {
        let file = write_config(
            ".json",
            r#"{
                "api": { "base_url": "https://api.example.com", "max_connections": 2 },
                "rate_limit": { "requests_per_second": 5, "burst_limit": 1 },
                "logging": { "level": "warn", "json": true }
            }"#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.api.max_connections, 2);
        assert_eq!(config.rate_limit.requests_per_second, 5);
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_file_fails_validation() {
        let file = write_config(".toml", "[api]\nbase_url = \"\"\n");

        assert!(matches!(
            load_from_file(Some(file.path().to_path_buf())),
            Err(ModSyncError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/modsync.toml")));
        assert!(matches!(result, Err(ModSyncError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let file = write_config(".json", r#"{ "this is": "not valid json" "#);
        assert!(load_from_file(Some(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api:\n  base_url: x\n", &PathBuf::from("modsync.yaml"));
        assert!(matches!(result, Err(ModSyncError::Config(_))));
    }
}
