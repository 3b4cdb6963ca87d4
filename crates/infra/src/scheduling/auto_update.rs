//! Periodic schema auto-update
//!
//! Runs [`SchemaSyncService::update_schema`] on a fixed interval in a
//! background task. Every run is spawned as its own task under a timeout,
//! so a failed, hung, or panicking run is logged and the next tick still
//! fires.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use modsync_core::SchemaSyncService;
//! use modsync_infra::scheduling::{AutoUpdateConfig, AutoUpdateScheduler};
//!
//! # async fn example(service: Arc<SchemaSyncService>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut scheduler = AutoUpdateScheduler::new(service, AutoUpdateConfig::from_hours(24)?)?;
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use modsync_core::SchemaSyncService;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the auto-update scheduler
#[derive(Debug, Clone)]
pub struct AutoUpdateConfig {
    /// Time between runs
    pub interval: Duration,
    /// Perform one run as soon as the scheduler starts
    pub run_immediately: bool,
    /// Upper bound on a single run
    pub run_timeout: Duration,
}

impl Default for AutoUpdateConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 3600),
            run_immediately: false,
            run_timeout: Duration::from_secs(300),
        }
    }
}

impl AutoUpdateConfig {
    /// Run every `hours` hours
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` for zero hours
    pub fn from_hours(hours: u64) -> SchedulerResult<Self> {
        if hours == 0 {
            return Err(SchedulerError::InvalidInterval(
                "interval must be at least one hour".to_string(),
            ));
        }
        let secs = hours.checked_mul(3600).ok_or_else(|| {
            SchedulerError::InvalidInterval(format!("{hours} hours is out of range"))
        })?;
        Ok(Self { interval: Duration::from_secs(secs), ..Self::default() })
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.interval.is_zero() {
            return Err(SchedulerError::InvalidInterval("interval must be non-zero".to_string()));
        }
        if self.run_timeout.is_zero() {
            return Err(SchedulerError::InvalidInterval(
                "run_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    runs: AtomicU64,
    failures: AtomicU64,
}

/// Background scheduler for [`SchemaSyncService::update_schema`]
pub struct AutoUpdateScheduler {
    service: Arc<SchemaSyncService>,
    config: AutoUpdateConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
    counters: Arc<RunCounters>,
}

impl AutoUpdateScheduler {
    /// Create a new scheduler
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterval` if the configuration is rejected
    pub fn new(service: Arc<SchemaSyncService>, config: AutoUpdateConfig) -> SchedulerResult<Self> {
        config.validate()?;
        Ok(Self {
            service,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
            counters: Arc::new(RunCounters::default()),
        })
    }

    pub fn config(&self) -> &AutoUpdateConfig {
        &self.config
    }

    /// Start the scheduler
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if the scheduler is already running
    #[instrument(skip(self), fields(interval_secs = self.config.interval.as_secs()))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting schema auto-update scheduler");

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let counters = Arc::clone(&self.counters);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::update_loop(service, counters, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Schema auto-update scheduler started");
        Ok(())
    }

    /// Stop the scheduler, waiting up to 5s for the background task
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` if not started, `Timeout` if the task does not
    /// finish in time, or `TaskJoinFailed` if it panicked
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping schema auto-update scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(STOP_JOIN_TIMEOUT, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: STOP_JOIN_TIMEOUT.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        info!(runs = self.run_count(), failures = self.failure_count(), "Scheduler stopped");
        Ok(())
    }

    /// Whether the background task is alive
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Runs started since construction
    pub fn run_count(&self) -> u64 {
        self.counters.runs.load(Ordering::Relaxed)
    }

    /// Runs that failed, timed out, or panicked
    pub fn failure_count(&self) -> u64 {
        self.counters.failures.load(Ordering::Relaxed)
    }

    async fn update_loop(
        service: Arc<SchemaSyncService>,
        counters: Arc<RunCounters>,
        config: AutoUpdateConfig,
        cancel: CancellationToken,
    ) {
        if config.run_immediately {
            Self::run_once(&service, &counters, config.run_timeout).await;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Auto-update loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    Self::run_once(&service, &counters, config.run_timeout).await;
                }
            }
        }
    }

    /// One guarded run; the outcome is only logged
    async fn run_once(service: &Arc<SchemaSyncService>, counters: &RunCounters, timeout: Duration) {
        let run = counters.runs.fetch_add(1, Ordering::Relaxed) + 1;
        let started = Instant::now();

        let task = {
            let service = Arc::clone(service);
            tokio::spawn(async move { service.update_schema().await })
        };
        let abort = task.abort_handle();

        let succeeded = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) if result.success => {
                info!(
                    run,
                    updated = result.updated,
                    version = ?result.current_version,
                    changes = result.changes.len(),
                    "Scheduled schema update completed"
                );
                true
            }
            Ok(Ok(result)) => {
                warn!(run, errors = ?result.errors, "Scheduled schema update failed");
                false
            }
            Ok(Err(join_err)) => {
                error!(run, error = %join_err, "Scheduled schema update task aborted");
                false
            }
            Err(_) => {
                abort.abort();
                warn!(run, timeout_secs = timeout.as_secs(), "Scheduled schema update timed out");
                false
            }
        };

        if !succeeded {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
        debug!(run, elapsed_ms = started.elapsed().as_millis() as u64, "Scheduled run finished");
    }
}

impl Drop for AutoUpdateScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
