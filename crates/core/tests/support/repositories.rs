//! In-memory port implementations for testing
//!
//! Each mock records what it received and can be told to fail, which lets
//! tests assert on exactly what the sync service persisted and emitted.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use modsync_core::sync::ports::{
    ChangeLogRepository, SchemaRepository, SchemaSource, SyncEventSink, ValidationRuleSink,
};
use modsync_core::SchemaSyncService;
use modsync_domain::{
    ChangeLogEntry, ModSyncError, Result as DomainResult, SchemaDefinition, SchemaUpdateEvent,
    ValidationRuleDefinition,
};

/// Schema source replaying scripted responses
///
/// Pops one response per fetch; the last response repeats once the script
/// runs out.
#[derive(Default)]
pub struct ScriptedSchemaSource {
    responses: Mutex<VecDeque<DomainResult<SchemaDefinition>>>,
    last: Mutex<Option<DomainResult<SchemaDefinition>>>,
    delay: Mutex<Option<Duration>>,
    pub fetches: AtomicUsize,
}

impl ScriptedSchemaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(schema: SchemaDefinition) -> Self {
        let source = Self::new();
        source.push(Ok(schema));
        source
    }

    pub fn push(&self, response: DomainResult<SchemaDefinition>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Delay every fetch, so a second caller can observe the update in
    /// progress
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for ScriptedSchemaSource {
    async fn fetch_schema(&self) -> DomainResult<SchemaDefinition> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                *self.last.lock().unwrap() = Some(response.clone());
                response
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(ModSyncError::Network("no scripted response".into()))),
        }
    }
}

/// In-memory current-schema slot
#[derive(Default)]
pub struct MemorySchemaRepository {
    stored: Mutex<Option<SchemaDefinition>>,
    fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemorySchemaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(schema: SchemaDefinition) -> Self {
        let repo = Self::new();
        *repo.stored.lock().unwrap() = Some(schema);
        repo
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn stored_version(&self) -> Option<String> {
        self.stored.lock().unwrap().as_ref().map(|s| s.version.clone())
    }
}

#[async_trait]
impl SchemaRepository for MemorySchemaRepository {
    async fn save_schema(&self, schema: &SchemaDefinition) -> DomainResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ModSyncError::Persistence("disk full".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(schema.clone());
        Ok(())
    }

    async fn load_current_schema(&self) -> DomainResult<Option<SchemaDefinition>> {
        Ok(self.stored.lock().unwrap().clone())
    }
}

/// In-memory change log
#[derive(Default)]
pub struct MemoryChangeLog {
    entries: Mutex<Vec<ChangeLogEntry>>,
    fail_appends: AtomicBool,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl ChangeLogRepository for MemoryChangeLog {
    async fn append(&self, entry: &ChangeLogEntry) -> DomainResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(ModSyncError::Persistence("change log unavailable".into()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn entries(&self) -> DomainResult<Vec<ChangeLogEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }
}

/// Event sink that keeps every event
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<SchemaUpdateEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<SchemaUpdateEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SyncEventSink for RecordingEventSink {
    fn emit(&self, event: &SchemaUpdateEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Rule sink that keeps every registered rule
#[derive(Default)]
pub struct RecordingRuleSink {
    rules: Mutex<Vec<ValidationRuleDefinition>>,
}

impl RecordingRuleSink {
    pub fn rule_ids(&self) -> Vec<String> {
        self.rules.lock().unwrap().iter().map(|r| r.id.clone()).collect()
    }
}

#[async_trait]
impl ValidationRuleSink for RecordingRuleSink {
    async fn register_rules(&self, rules: &[ValidationRuleDefinition]) -> DomainResult<()> {
        self.rules.lock().unwrap().extend_from_slice(rules);
        Ok(())
    }
}

/// A service wired to mocks, with handles to each mock
pub struct Harness {
    pub service: Arc<SchemaSyncService>,
    pub source: Arc<ScriptedSchemaSource>,
    pub schemas: Arc<MemorySchemaRepository>,
    pub change_log: Arc<MemoryChangeLog>,
    pub events: Arc<RecordingEventSink>,
    pub rules: Arc<RecordingRuleSink>,
}

impl Harness {
    pub fn new(source: ScriptedSchemaSource, schemas: MemorySchemaRepository) -> Self {
        let source = Arc::new(source);
        let schemas = Arc::new(schemas);
        let change_log = Arc::new(MemoryChangeLog::new());
        let events = Arc::new(RecordingEventSink::default());
        let rules = Arc::new(RecordingRuleSink::default());

        let service = Arc::new(SchemaSyncService::new(
            source.clone(),
            schemas.clone(),
            change_log.clone(),
            events.clone(),
            rules.clone(),
        ));

        Self { service, source, schemas, change_log, events, rules }
    }
}
