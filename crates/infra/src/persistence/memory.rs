//! In-memory schema store

use async_trait::async_trait;
use modsync_core::{ChangeLogRepository, SchemaRepository};
use modsync_domain::{ChangeLogEntry, Result, SchemaDefinition};
use parking_lot::RwLock;

/// Process-local schema slot and change log
#[derive(Debug, Default)]
pub struct InMemorySchemaStore {
    current: RwLock<Option<SchemaDefinition>>,
    change_log: RwLock<Vec<ChangeLogEntry>>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaRepository for InMemorySchemaStore {
    async fn save_schema(&self, schema: &SchemaDefinition) -> Result<()> {
        *self.current.write() = Some(schema.clone());
        Ok(())
    }

    async fn load_current_schema(&self) -> Result<Option<SchemaDefinition>> {
        Ok(self.current.read().clone())
    }
}

#[async_trait]
impl ChangeLogRepository for InMemorySchemaStore {
    async fn append(&self, entry: &ChangeLogEntry) -> Result<()> {
        self.change_log.write().push(entry.clone());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<ChangeLogEntry>> {
        Ok(self.change_log.read().clone())
    }
}
