//! Schema synchronization service - core business logic
//!
//! One update cycle moves through `Idle → Fetching → Diffing → Validating →
//! Persisting → Idle`. A single in-progress flag makes concurrent
//! `update_schema` calls fail fast with [`SyncError::ConcurrentUpdate`]
//! instead of queueing.
//!
//! A failed cycle never touches the current schema: the candidate is
//! persisted before it replaces the in-memory copy, so a persistence error
//! leaves both unchanged.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use modsync_domain::{
    ChangeLogEntry, DiffAnalysis, DiffOptions, SchemaDefinition, SchemaUpdateEvent,
    SchemaUpdateResult, SyncState, SyncStatus, ValidationRuleDefinition,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use super::error::SyncError;
use super::ports::{
    ChangeLogRepository, SchemaRepository, SchemaSource, SyncEventSink, ValidationRuleSink,
};
use crate::schema::{validate_upgrade, SchemaDiffEngine};

#[derive(Debug, Default)]
struct History {
    last_attempt_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Keeps the local schema in step with the platform
pub struct SchemaSyncService {
    source: Arc<dyn SchemaSource>,
    schemas: Arc<dyn SchemaRepository>,
    change_log: Arc<dyn ChangeLogRepository>,
    events: Arc<dyn SyncEventSink>,
    rule_sink: Arc<dyn ValidationRuleSink>,
    engine: SchemaDiffEngine,
    current: RwLock<Option<Arc<SchemaDefinition>>>,
    updating: AtomicBool,
    state: AtomicU8,
    history: Mutex<History>,
}

/// Clears the in-progress flag and resets the state on every exit path
struct UpdateGuard<'a> {
    service: &'a SchemaSyncService,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.service.set_state(SyncState::Idle);
        self.service.updating.store(false, Ordering::Release);
    }
}

impl SchemaSyncService {
    /// Create a new sync service
    pub fn new(
        source: Arc<dyn SchemaSource>,
        schemas: Arc<dyn SchemaRepository>,
        change_log: Arc<dyn ChangeLogRepository>,
        events: Arc<dyn SyncEventSink>,
        rule_sink: Arc<dyn ValidationRuleSink>,
    ) -> Self {
        Self {
            source,
            schemas,
            change_log,
            events,
            rule_sink,
            engine: SchemaDiffEngine::new(),
            current: RwLock::new(None),
            updating: AtomicBool::new(false),
            state: AtomicU8::new(SyncState::Idle.as_u8()),
            history: Mutex::new(History::default()),
        }
    }

    /// Set the options applied to every diff this service computes
    pub fn with_diff_options(mut self, options: DiffOptions) -> Self {
        self.engine = SchemaDiffEngine::with_options(options);
        self
    }

    /// Load the persisted current schema into memory
    ///
    /// Returns the loaded version, if a schema was stored.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<Option<String>, SyncError> {
        let stored = self.schemas.load_current_schema().await.map_err(SyncError::Persistence)?;
        let version = stored.as_ref().map(|s| s.version.clone());

        match &version {
            Some(version) => info!(%version, "Loaded persisted schema"),
            None => info!("No persisted schema found"),
        }

        *self.current.write() = stored.map(Arc::new);
        Ok(version)
    }

    /// Current schema, if one has been loaded or fetched
    pub fn current_schema(&self) -> Option<Arc<SchemaDefinition>> {
        self.current.read().clone()
    }

    pub fn current_version(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.version.clone())
    }

    /// Check if an update cycle is running
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot of the service for status reporting
    pub fn status(&self) -> SyncStatus {
        let history = self.history.lock();
        SyncStatus {
            state: self.state(),
            current_version: self.current_version(),
            last_attempt_at: history.last_attempt_at,
            last_success_at: history.last_success_at,
            last_error: history.last_error.clone(),
        }
    }

    /// Diff a candidate schema against the current one without applying it
    pub fn analyze(&self, candidate: &SchemaDefinition) -> Result<DiffAnalysis, SyncError> {
        let current = self.current_schema().ok_or(SyncError::NoCurrentSchema)?;
        Ok(self.engine.diff(&current, candidate))
    }

    /// Run one update cycle
    ///
    /// Never returns `Err`: failures are reported through the result's
    /// `success` and `errors` fields.
    #[instrument(skip(self))]
    pub async fn update_schema(&self) -> SchemaUpdateResult {
        let started = Instant::now();

        let Some(_guard) = self.try_begin_update() else {
            warn!("Schema update already in progress, rejecting concurrent call");
            return SchemaUpdateResult::failed(
                self.current_version(),
                SyncError::ConcurrentUpdate.to_string(),
            );
        };
        let previous_version = self.current_version();

        self.history.lock().last_attempt_at = Some(Utc::now());

        let mut result = match self.run_update(previous_version.clone()).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "Schema update failed");
                SchemaUpdateResult::failed(previous_version, err.to_string())
            }
        };
        result.duration_ms = started.elapsed().as_millis() as u64;

        {
            let mut history = self.history.lock();
            if result.success {
                history.last_success_at = Some(Utc::now());
                history.last_error = None;
            } else {
                history.last_error = result.errors.first().cloned();
            }
        }

        self.events.emit(&SchemaUpdateEvent::from(&result));
        result
    }

    fn try_begin_update(&self) -> Option<UpdateGuard<'_>> {
        self.updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| UpdateGuard { service: self })
    }

    fn set_state(&self, state: SyncState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    async fn run_update(
        &self,
        previous_version: Option<String>,
    ) -> Result<SchemaUpdateResult, SyncError> {
        self.set_state(SyncState::Fetching);
        let fetched = self.source.fetch_schema().await.map_err(SyncError::Fetch)?;
        let current = self.current_schema();

        if current.as_ref().is_some_and(|c| c.version == fetched.version) {
            info!(version = %fetched.version, "Schema already up to date");
            return Ok(SchemaUpdateResult {
                success: true,
                updated: false,
                previous_version: previous_version.clone(),
                current_version: previous_version,
                changes: Vec::new(),
                analysis: None,
                new_validation_rules: Vec::new(),
                warnings: Vec::new(),
                errors: Vec::new(),
                duration_ms: 0,
            });
        }

        let analysis = match &current {
            Some(current) => {
                self.set_state(SyncState::Diffing);
                Some(self.engine.diff(current, &fetched))
            }
            None => None,
        };

        self.set_state(SyncState::Validating);
        validate_upgrade(current.as_deref(), &fetched).map_err(SyncError::Validation)?;

        self.set_state(SyncState::Persisting);
        self.schemas.save_schema(&fetched).await.map_err(SyncError::Persistence)?;

        let new_rules = new_validation_rules(current.as_deref(), &fetched);
        let fetched = Arc::new(fetched);
        *self.current.write() = Some(Arc::clone(&fetched));

        let mut warnings = Vec::new();

        if let Some(analysis) = analysis.as_ref().filter(|a| a.has_changes()) {
            let entry = ChangeLogEntry::from_analysis(analysis);
            if let Err(err) = self.change_log.append(&entry).await {
                warn!(error = %err, "Failed to append schema change log entry");
                warnings.push(format!("Failed to append change log entry: {err}"));
            }
        }

        if !new_rules.is_empty() {
            if let Err(err) = self.rule_sink.register_rules(&new_rules).await {
                warn!(error = %err, count = new_rules.len(), "Failed to register validation rules");
                warnings.push(format!("Failed to register new validation rules: {err}"));
            }
        }

        let changes = analysis.as_ref().map(|a| a.changes.clone()).unwrap_or_default();
        let breaking = changes.iter().filter(|c| c.is_breaking()).count();
        let migrations = changes.iter().filter(|c| c.migration_required).count();
        if breaking > 0 {
            warnings.push(format!("{breaking} breaking change(s) detected"));
        }
        if migrations > 0 {
            warnings.push(format!("{migrations} change(s) require migration"));
        }

        info!(
            from = previous_version.as_deref().unwrap_or("none"),
            to = %fetched.version,
            changes = changes.len(),
            breaking,
            "Schema updated"
        );
        debug!(new_rules = new_rules.len(), warnings = warnings.len(), "Update cycle details");

        Ok(SchemaUpdateResult {
            success: true,
            updated: true,
            previous_version,
            current_version: Some(fetched.version.clone()),
            changes,
            analysis,
            new_validation_rules: new_rules,
            warnings,
            errors: Vec::new(),
            duration_ms: 0,
        })
    }
}

/// Rules in `fetched` whose ids are not in `current` (all of them on first
/// load)
fn new_validation_rules(
    current: Option<&SchemaDefinition>,
    fetched: &SchemaDefinition,
) -> Vec<ValidationRuleDefinition> {
    fetched
        .validation_rules
        .iter()
        .filter(|rule| current.map_or(true, |c| c.validation_rule(&rule.id).is_none()))
        .cloned()
        .collect()
}
