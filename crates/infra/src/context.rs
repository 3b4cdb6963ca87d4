//! Process-wide wiring
//!
//! [`SyncContext::build`] constructs every long-lived component exactly once
//! from a validated [`Config`] and hands out `Arc`s. Nothing here is a
//! global; tests build as many contexts as they like.

use std::sync::Arc;

use modsync_common::{RateLimiterConfig, TenantRateLimiter};
use modsync_core::{ChangeLogRepository, SchemaRepository, SchemaSyncService};
use modsync_domain::{Config, ModSyncError, Result};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::{HttpSchemaSource, ResilientHttpClient};
use crate::auth::CredentialStore;
use crate::observability::{LoggingRuleSink, TracingEventSink};
use crate::persistence::{FileSchemaStore, InMemorySchemaStore};
use crate::scheduling::{AutoUpdateConfig, AutoUpdateScheduler};

/// Every long-lived component of a running sync process
pub struct SyncContext {
    config: Config,
    credentials: Arc<CredentialStore>,
    rate_limiter: Arc<TenantRateLimiter>,
    client: Arc<ResilientHttpClient>,
    service: Arc<SchemaSyncService>,
    scheduler: Option<tokio::sync::Mutex<AutoUpdateScheduler>>,
    shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SyncContext {
    /// Validate `config` and construct all components
    ///
    /// Persistence is file-backed when `sync.storage_dir` is set and
    /// in-memory otherwise. The auto-update scheduler exists only when
    /// `sync.auto_update_interval_hours` is set; nothing is started here.
    ///
    /// # Errors
    ///
    /// Returns `Config` if validation fails or a component rejects its
    /// settings
    pub fn build(config: Config) -> Result<Self> {
        config.validate()?;

        let credentials = Arc::new(CredentialStore::new(config.auth.clone())?);
        let rate_limiter = Arc::new(
            TenantRateLimiter::new(RateLimiterConfig::per_second(
                config.rate_limit.requests_per_second,
                config.rate_limit.burst_limit,
            ))
            .map_err(ModSyncError::Config)?,
        );

        let client = Arc::new(
            ResilientHttpClient::builder()
                .api(config.api.clone())
                .retry(config.retry.clone())
                .rate_limiter(Arc::clone(&rate_limiter))
                .credentials(Arc::clone(&credentials))
                .build()?,
        );

        let source = Arc::new(HttpSchemaSource::new(
            Arc::clone(&client),
            config.sync.tenant_id.clone(),
            config.sync.schema_path.clone(),
        ));

        let (schemas, change_log): (Arc<dyn SchemaRepository>, Arc<dyn ChangeLogRepository>) =
            match &config.sync.storage_dir {
                Some(dir) => {
                    let store = Arc::new(FileSchemaStore::new(dir));
                    (store.clone() as Arc<dyn SchemaRepository>, store as Arc<dyn ChangeLogRepository>)
                }
                None => {
                    let store = Arc::new(InMemorySchemaStore::new());
                    (store.clone() as Arc<dyn SchemaRepository>, store as Arc<dyn ChangeLogRepository>)
                }
            };

        let service = Arc::new(SchemaSyncService::new(
            source,
            schemas,
            change_log,
            Arc::new(TracingEventSink),
            Arc::new(LoggingRuleSink),
        ));

        let scheduler = match config.sync.auto_update_interval_hours {
            Some(hours) => {
                let schedule = AutoUpdateConfig::from_hours(hours)?;
                Some(tokio::sync::Mutex::new(AutoUpdateScheduler::new(
                    Arc::clone(&service),
                    schedule,
                )?))
            }
            None => None,
        };

        info!(
            tenant_id = %config.sync.tenant_id,
            storage_dir = ?config.sync.storage_dir,
            auto_update_hours = ?config.sync.auto_update_interval_hours,
            "Sync context built"
        );

        Ok(Self {
            config,
            credentials,
            rate_limiter,
            client,
            service,
            scheduler,
            shutdown: CancellationToken::new(),
            sweeper: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn rate_limiter(&self) -> &Arc<TenantRateLimiter> {
        &self.rate_limiter
    }

    pub fn client(&self) -> &Arc<ResilientHttpClient> {
        &self.client
    }

    pub fn service(&self) -> &Arc<SchemaSyncService> {
        &self.service
    }

    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Load the persisted schema into the sync service
    pub async fn initialize(&self) -> Result<Option<String>> {
        Ok(self.service.initialize().await?)
    }

    /// Start the rate-limit sweeper and, if configured, the auto-update
    /// scheduler
    #[instrument(skip(self))]
    pub async fn start_background(&self) -> Result<()> {
        {
            let mut sweeper = self.sweeper.lock();
            if sweeper.is_none() {
                *sweeper = Some(self.rate_limiter.spawn_sweeper(self.shutdown.child_token()));
            }
        }

        if let Some(scheduler) = &self.scheduler {
            let mut scheduler = scheduler.lock().await;
            if !scheduler.is_running() {
                scheduler.start().await?;
            }
        }
        Ok(())
    }

    /// Stop background tasks
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(scheduler) = &self.scheduler {
            let mut scheduler = scheduler.lock().await;
            if scheduler.is_running() {
                scheduler.stop().await?;
            }
        }

        self.shutdown.cancel();
        let sweeper = self.sweeper.lock().take();
        if let Some(handle) = sweeper {
            if let Err(e) = handle.await {
                warn!(error = %e, "Rate-limit sweeper ended abnormally");
            }
        }

        info!("Sync context shut down");
        Ok(())
    }
}

impl Drop for SyncContext {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("tenant_id", &self.config.sync.tenant_id)
            .field("client", &self.client)
            .field("has_scheduler", &self.scheduler.is_some())
            .finish()
    }
}
