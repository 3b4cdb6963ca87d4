//! Per-tenant rate limiting with a standard window and a burst allowance
//!
//! Each tenant owns two counters that refill together once per window:
//! - **Standard window**: `requests_per_window` permits, consumed first
//! - **Burst allowance**: `burst_limit` permits, consumed only once the
//!   standard window is exhausted
//!
//! When both are empty, [`TenantRateLimiter::acquire`] suspends the calling
//! task until the window resets. Other tenants are unaffected.
//!
//! Windows reset lazily on the next access after `reset_at`, or eagerly via
//! [`TenantRateLimiter::sweep`] (driven by [`TenantRateLimiter::spawn_sweeper`]).
//! Both paths go through the same reset routine, so they leave identical
//! state behind.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{Clock, SystemClock};

/// Configuration for the per-tenant rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Permits in the standard window
    pub requests_per_window: u32,
    /// Extra permits available once the standard window is exhausted
    pub burst_limit: u32,
    /// Window length (one second for a requests-per-second limit)
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { requests_per_window: 10, burst_limit: 5, window: Duration::from_secs(1) }
    }
}

impl RateLimiterConfig {
    /// Configuration for a requests-per-second limit with a burst allowance
    pub fn per_second(requests_per_second: u32, burst_limit: u32) -> Self {
        Self { requests_per_window: requests_per_second, burst_limit, window: Duration::from_secs(1) }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_window == 0 {
            return Err("requests_per_window must be greater than 0".to_string());
        }
        if self.window.is_zero() {
            return Err("window must be greater than zero".to_string());
        }
        Ok(())
    }

    fn window_millis(&self) -> u64 {
        (self.window.as_millis() as u64).max(1)
    }
}

/// Snapshot of one tenant's rate-limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Permits left in the standard window
    pub standard_remaining: u32,
    /// Burst permits left
    pub burst_remaining: u32,
    /// When the window resets, in epoch milliseconds
    pub reset_at_ms: u64,
    /// Cumulative permits granted to this tenant
    pub total_requests: u64,
}

impl RateLimitStatus {
    fn fresh(config: &RateLimiterConfig, now_ms: u64) -> Self {
        Self {
            standard_remaining: config.requests_per_window,
            burst_remaining: config.burst_limit,
            reset_at_ms: now_ms.saturating_add(config.window_millis()),
            total_requests: 0,
        }
    }

    /// Refill both counters if the window has elapsed. Returns `true` when a
    /// reset happened.
    fn reset_if_expired(&mut self, config: &RateLimiterConfig, now_ms: u64) -> bool {
        if now_ms < self.reset_at_ms {
            return false;
        }
        self.standard_remaining = config.requests_per_window;
        self.burst_remaining = config.burst_limit;
        self.reset_at_ms = now_ms.saturating_add(config.window_millis());
        true
    }

    /// Check whether any permit is left in the current window
    pub fn has_capacity(&self) -> bool {
        self.standard_remaining > 0 || self.burst_remaining > 0
    }
}

/// Which allowance a granted permit was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    /// Drawn from the standard window
    Standard,
    /// Drawn from the burst allowance
    Burst,
}

/// Rate limiter keyed by tenant id
///
/// # Examples
///
/// ```rust
/// use modsync_common::resilience::{RateLimiterConfig, TenantRateLimiter};
///
/// # async fn example() -> Result<(), String> {
/// let limiter = TenantRateLimiter::new(RateLimiterConfig::per_second(10, 5))?;
///
/// // Suspends only if portal 123 has used its window and burst
/// limiter.acquire("123").await;
/// # Ok(())
/// # }
/// ```
pub struct TenantRateLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    windows: DashMap<String, RateLimitStatus>,
    clock: Arc<C>,
}

impl<C: Clock> TenantRateLimiter<C> {
    /// Create a new limiter with a custom clock
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config, windows: DashMap::new(), clock: Arc::new(clock) })
    }

    /// Get the limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Take a permit for `tenant_id` without waiting
    ///
    /// On exhaustion returns how long until the tenant's window resets.
    fn take(&self, tenant_id: &str) -> Result<Permit, Duration> {
        let now = self.clock.millis_since_epoch();
        let mut window = self
            .windows
            .entry(tenant_id.to_owned())
            .or_insert_with(|| RateLimitStatus::fresh(&self.config, now));

        window.reset_if_expired(&self.config, now);

        if window.standard_remaining > 0 {
            window.standard_remaining -= 1;
            window.total_requests += 1;
            trace!(tenant_id, remaining = window.standard_remaining, "Standard permit granted");
            Ok(Permit::Standard)
        } else if window.burst_remaining > 0 {
            window.burst_remaining -= 1;
            window.total_requests += 1;
            debug!(tenant_id, burst_remaining = window.burst_remaining, "Burst permit granted");
            Ok(Permit::Burst)
        } else {
            Err(Duration::from_millis(window.reset_at_ms.saturating_sub(now).max(1)))
        }
    }

    /// Try to take a permit without suspending
    ///
    /// Returns `true` if a permit was granted.
    pub fn try_acquire(&self, tenant_id: &str) -> bool {
        self.take(tenant_id).is_ok()
    }

    /// Take a permit, suspending until the window resets if necessary
    ///
    /// The tenant's entry is never locked while waiting, so concurrent
    /// callers for the same tenant queue up on the next reset and other
    /// tenants proceed immediately.
    pub async fn acquire(&self, tenant_id: &str) -> Permit {
        loop {
            match self.take(tenant_id) {
                Ok(permit) => return permit,
                Err(wait) => {
                    debug!(tenant_id, wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting for window reset");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Apply authoritative counters reported by the server
    ///
    /// Each field overwrites the local estimate only when present. A reported
    /// remaining count above the configured window size is clamped.
    pub fn update_from_response(
        &self,
        tenant_id: &str,
        remaining: Option<u32>,
        reset_at_ms: Option<u64>,
    ) {
        if remaining.is_none() && reset_at_ms.is_none() {
            return;
        }

        let now = self.clock.millis_since_epoch();
        let mut window = self
            .windows
            .entry(tenant_id.to_owned())
            .or_insert_with(|| RateLimitStatus::fresh(&self.config, now));

        if let Some(remaining) = remaining {
            window.standard_remaining = remaining.min(self.config.requests_per_window);
        }
        if let Some(reset_at_ms) = reset_at_ms {
            window.reset_at_ms = reset_at_ms;
        }

        debug!(
            tenant_id,
            standard_remaining = window.standard_remaining,
            reset_at_ms = window.reset_at_ms,
            "Rate limit state updated from response headers"
        );
    }

    /// Current status for a tenant, after applying any due reset
    pub fn status(&self, tenant_id: &str) -> Option<RateLimitStatus> {
        let now = self.clock.millis_since_epoch();
        let mut window = self.windows.get_mut(tenant_id)?;
        window.reset_if_expired(&self.config, now);
        Some(*window)
    }

    /// Reset every window whose reset time has passed
    ///
    /// Returns the number of windows reset.
    pub fn sweep(&self) -> usize {
        let now = self.clock.millis_since_epoch();
        let mut reset = 0;
        for mut window in self.windows.iter_mut() {
            if window.reset_if_expired(&self.config, now) {
                reset += 1;
            }
        }
        if reset > 0 {
            trace!(reset, "Swept expired rate-limit windows");
        }
        reset
    }

    /// Number of tenants with tracked windows
    pub fn tenant_count(&self) -> usize {
        self.windows.len()
    }

    /// Forget a tenant's window (the next request starts a fresh one)
    pub fn remove(&self, tenant_id: &str) {
        self.windows.remove(tenant_id);
    }

    /// Spawn a background task that sweeps expired windows once per window
    ///
    /// The task exits when `cancel` is triggered.
    pub fn spawn_sweeper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = limiter.config.window;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Rate-limit sweeper cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        limiter.sweep();
                    }
                }
            }
        })
    }
}

impl TenantRateLimiter<SystemClock> {
    /// Create a new limiter with the system clock
    pub fn new(config: RateLimiterConfig) -> Result<Self, String> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> std::fmt::Debug for TenantRateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRateLimiter")
            .field("config", &self.config)
            .field("tenants", &self.windows.len())
            .finish()
    }
}
