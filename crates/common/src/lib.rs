//! Modular common utilities shared across ModSync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification and severity levels
//! - `runtime`: async resilience primitives (per-tenant rate limiting,
//!   exponential backoff, bounded connection accounting, clock abstraction)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{
    BackoffStrategy, Clock, ConnectionGuard, ConnectionPool, ConnectionPoolConfig, MockClock,
    PoolError, PoolMetrics, RateLimitStatus, RateLimiterConfig, SystemClock, TenantRateLimiter,
};
