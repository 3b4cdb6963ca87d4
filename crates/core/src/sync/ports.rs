//! Port interfaces for schema synchronization

use async_trait::async_trait;
use modsync_domain::{
    ChangeLogEntry, Result, SchemaDefinition, SchemaUpdateEvent, ValidationRuleDefinition,
};

/// Source of the platform's live schema
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetch the latest schema snapshot
    async fn fetch_schema(&self) -> Result<SchemaDefinition>;
}

/// Key-value slot holding the current schema
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Replace the stored current schema
    async fn save_schema(&self, schema: &SchemaDefinition) -> Result<()>;

    /// Load the stored current schema, if any
    async fn load_current_schema(&self) -> Result<Option<SchemaDefinition>>;
}

/// Append-only log of applied schema changes
#[async_trait]
pub trait ChangeLogRepository: Send + Sync {
    /// Append one entry
    async fn append(&self, entry: &ChangeLogEntry) -> Result<()>;

    /// All entries, oldest first
    async fn entries(&self) -> Result<Vec<ChangeLogEntry>>;
}

/// Receiver of one event per update cycle
pub trait SyncEventSink: Send + Sync {
    fn emit(&self, event: &SchemaUpdateEvent);
}

/// External module validator that executes validation rules
#[async_trait]
pub trait ValidationRuleSink: Send + Sync {
    /// Hand over newly introduced rule definitions
    async fn register_rules(&self, rules: &[ValidationRuleDefinition]) -> Result<()>;
}
