//! Resilience primitives for talking to a rate-limited remote platform
//!
//! This module provides the **generic, reusable** pieces the API client is
//! assembled from:
//! - **Rate Limiting**: per-tenant standard window plus burst allowance,
//!   with lazy and background window resets
//! - **Backoff**: delay calculation for retry loops
//! - **Connection Accounting**: bounded in-flight request slots whose
//!   release is tied to a guard's lifetime
//! - **Clock**: time abstraction so window logic can be tested without
//!   sleeping
//!
//! Nothing here knows about schemas, credentials, or HTTP. The API client in
//! `modsync-infra` composes these into its request loop.

pub mod backoff;
pub mod clock;
pub mod connection_pool;
pub mod rate_limiter;

pub use backoff::BackoffStrategy;
pub use clock::{Clock, MockClock, SystemClock};
pub use connection_pool::{
    ConnectionGuard, ConnectionPool, ConnectionPoolConfig, PoolError, PoolMetrics,
};
pub use rate_limiter::{RateLimitStatus, RateLimiterConfig, TenantRateLimiter};
