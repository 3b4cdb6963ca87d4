//! Bounded connection accounting
//!
//! [`ConnectionPool`] caps the number of in-flight requests. A caller takes a
//! [`ConnectionGuard`] before sending and the slot is released when the guard
//! drops, on every exit path including errors and cancellation. The active
//! count therefore always returns to zero once all requests finish.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Errors returned when a connection slot cannot be obtained
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No slot became free within the acquire timeout
    #[error("Timed out after {timeout:?} waiting for a connection slot")]
    Timeout { timeout: Duration },

    /// Every slot is in use and the caller asked not to wait
    #[error("Connection pool exhausted ({capacity} connections in use)")]
    Exhausted { capacity: usize },

    /// The pool has been closed
    #[error("Connection pool is closed")]
    Closed,
}

/// Configuration for [`ConnectionPool`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPoolConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// How long to wait for a free slot (`None` waits indefinitely)
    pub acquire_timeout: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self { max_connections: 10, acquire_timeout: None }
    }
}

impl ConnectionPoolConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Point-in-time pool metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Connections currently held
    pub active: usize,
    /// Configured capacity
    pub max_connections: usize,
    /// Guards handed out since creation
    pub total_acquired: u64,
    /// Acquisitions that timed out
    pub timeouts: u64,
}

impl PoolMetrics {
    /// Current utilization (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.active as f64 / self.max_connections as f64
    }

    /// Check if every slot is in use
    pub fn is_at_capacity(&self) -> bool {
        self.active >= self.max_connections
    }
}

#[derive(Debug)]
struct PoolState {
    semaphore: Arc<Semaphore>,
    active: AtomicUsize,
    total_acquired: AtomicU64,
    timeouts: AtomicU64,
}

/// Semaphore-backed pool of connection slots
///
/// Cloning is cheap; clones share the same slots.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    config: ConnectionPoolConfig,
    state: Arc<PoolState>,
}

impl ConnectionPool {
    /// Create a pool with the given configuration
    pub fn new(config: ConnectionPoolConfig) -> Result<Self, String> {
        config.validate()?;
        let state = PoolState {
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            active: AtomicUsize::new(0),
            total_acquired: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        };
        Ok(Self { config, state: Arc::new(state) })
    }

    /// Create a pool with `max_connections` slots and no acquire timeout
    pub fn with_capacity(max_connections: usize) -> Result<Self, String> {
        Self::new(ConnectionPoolConfig { max_connections, acquire_timeout: None })
    }

    fn guard(&self, permit: OwnedSemaphorePermit) -> ConnectionGuard {
        let active = self.state.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.total_acquired.fetch_add(1, Ordering::Relaxed);
        trace!(active, max = self.config.max_connections, "Connection slot acquired");
        ConnectionGuard { state: Arc::clone(&self.state), _permit: permit }
    }

    /// Wait for a free slot, honoring the configured acquire timeout
    pub async fn acquire(&self) -> Result<ConnectionGuard, PoolError> {
        let semaphore = Arc::clone(&self.state.semaphore);

        let permit = match self.config.acquire_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, semaphore.acquire_owned()).await {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => return Err(PoolError::Closed),
                Err(_) => {
                    self.state.timeouts.fetch_add(1, Ordering::Relaxed);
                    debug!(?timeout, "Timed out waiting for connection slot");
                    return Err(PoolError::Timeout { timeout });
                }
            },
            None => semaphore.acquire_owned().await.map_err(|_| PoolError::Closed)?,
        };

        Ok(self.guard(permit))
    }

    /// Take a slot only if one is free right now
    pub fn try_acquire(&self) -> Result<ConnectionGuard, PoolError> {
        match Arc::clone(&self.state.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(self.guard(permit)),
            Err(tokio::sync::TryAcquireError::NoPermits) => {
                Err(PoolError::Exhausted { capacity: self.config.max_connections })
            }
            Err(tokio::sync::TryAcquireError::Closed) => Err(PoolError::Closed),
        }
    }

    /// Connections currently held
    pub fn active_connections(&self) -> usize {
        self.state.active.load(Ordering::Acquire)
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.state.semaphore.available_permits()
    }

    /// Close the pool; pending and future acquisitions fail with
    /// [`PoolError::Closed`]. Held guards stay valid.
    pub fn close(&self) {
        self.state.semaphore.close();
    }

    /// Snapshot of pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            active: self.active_connections(),
            max_connections: self.config.max_connections,
            total_acquired: self.state.total_acquired.load(Ordering::Relaxed),
            timeouts: self.state.timeouts.load(Ordering::Relaxed),
        }
    }

    /// Get the pool configuration
    pub fn config(&self) -> &ConnectionPoolConfig {
        &self.config
    }
}

/// RAII handle for one connection slot
///
/// Dropping the guard decrements the active count and frees the slot.
#[derive(Debug)]
pub struct ConnectionGuard {
    state: Arc<PoolState>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let previous = self.state.active.fetch_sub(1, Ordering::AcqRel);
        trace!(active = previous.saturating_sub(1), "Connection slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let pool = ConnectionPool::with_capacity(2).unwrap();

        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        assert_eq!(pool.active_connections(), 2);
        assert!(pool.metrics().is_at_capacity());

        drop(first);
        assert_eq!(pool.active_connections(), 1);
        drop(second);
        assert_eq!(pool.active_connections(), 0);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.metrics().total_acquired, 2);
    }

    #[tokio::test]
    async fn test_try_acquire_reports_exhaustion() {
        let pool = ConnectionPool::with_capacity(1).unwrap();
        let _held = pool.try_acquire().unwrap();

        assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Exhausted { capacity: 1 });
    }

    #[tokio::test]
    async fn test_acquire_times_out() {
        let pool = ConnectionPool::new(ConnectionPoolConfig {
            max_connections: 1,
            acquire_timeout: Some(Duration::from_millis(20)),
        })
        .unwrap();
        let _held = pool.acquire().await.unwrap();

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, PoolError::Timeout { .. }));
        assert_eq!(pool.metrics().timeouts, 1);
        assert_eq!(pool.active_connections(), 1);
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let pool = ConnectionPool::with_capacity(1).unwrap();
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move {
                let _guard = pool.acquire().await.unwrap();
                pool.active_connections()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);

        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(pool.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_closed_pool_rejects() {
        let pool = ConnectionPool::with_capacity(1).unwrap();
        pool.close();

        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::Closed);
        assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Closed);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ConnectionPool::with_capacity(0).is_err());
    }
}
