//! Application constants
//!
//! Centralized location for domain-level defaults and thresholds.

// Platform API defaults
pub const DEFAULT_API_VERSION: &str = "v3";
pub const DEFAULT_SCHEMA_PATH: &str = "/content/modules/schema";
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

// Persistence defaults
pub const DEFAULT_STORAGE_DIR: &str = ".modsync";
pub const CURRENT_SCHEMA_FILE: &str = "current_schema.json";
pub const CHANGELOG_FILE: &str = "schema_changelog.jsonl";

// Rate-limit response headers
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

// Risk thresholds on breaking-change count (upper bounds, inclusive)
pub const MEDIUM_RISK_MAX_BREAKING: usize = 2;
pub const HIGH_RISK_MAX_BREAKING: usize = 5;

// Fixed migration phase durations (hours)
pub const PREPARATION_PHASE_HOURS: f64 = 2.0;
pub const VALIDATION_PHASE_HOURS: f64 = 4.0;
