//! JSON-file schema store
//!
//! Layout under the store directory:
//!
//! - `current_schema.json`: the current schema, replaced atomically by
//!   writing a sibling temp file and renaming it over the original
//! - `schema_changelog.jsonl`: one [`ChangeLogEntry`] per line, append-only
//!
//! Missing files read as "nothing stored yet". Unparseable change-log lines
//! (e.g. a torn final write) are skipped with a warning.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use modsync_core::{ChangeLogRepository, SchemaRepository};
use modsync_domain::constants::{CHANGELOG_FILE, CURRENT_SCHEMA_FILE};
use modsync_domain::{ChangeLogEntry, ModSyncError, Result, SchemaDefinition};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

/// File-backed schema slot and change log
#[derive(Debug)]
pub struct FileSchemaStore {
    dir: PathBuf,
    // Serializes writers within this process
    write_lock: Mutex<()>,
}

impl FileSchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), write_lock: Mutex::new(()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(CURRENT_SCHEMA_FILE)
    }

    pub fn change_log_path(&self) -> PathBuf {
        self.dir.join(CHANGELOG_FILE)
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await.map_err(to_domain)
    }
}

fn to_domain<E>(err: E) -> ModSyncError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}

#[async_trait]
impl SchemaRepository for FileSchemaStore {
    #[instrument(skip(self, schema), fields(version = %schema.version))]
    async fn save_schema(&self, schema: &SchemaDefinition) -> Result<()> {
        let data = serde_json::to_vec_pretty(schema).map_err(to_domain)?;

        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;

        let path = self.schema_path();
        let temp_path = path.with_extension("json.tmp");

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(to_domain)?;
        file.write_all(&data).await.map_err(to_domain)?;
        file.sync_all().await.map_err(to_domain)?;
        drop(file);

        fs::rename(&temp_path, &path).await.map_err(to_domain)?;

        info!(path = %path.display(), bytes = data.len(), "Persisted current schema");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_current_schema(&self) -> Result<Option<SchemaDefinition>> {
        let path = self.schema_path();
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No persisted schema");
                return Ok(None);
            }
            Err(err) => return Err(to_domain(err)),
        };

        let schema: SchemaDefinition = serde_json::from_slice(&data).map_err(to_domain)?;
        debug!(version = %schema.version, "Loaded persisted schema");
        Ok(Some(schema))
    }
}

#[async_trait]
impl ChangeLogRepository for FileSchemaStore {
    #[instrument(skip(self, entry), fields(from = %entry.from_version, to = %entry.to_version))]
    async fn append(&self, entry: &ChangeLogEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry).map_err(to_domain)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.change_log_path())
            .await
            .map_err(to_domain)?;
        file.write_all(&line).await.map_err(to_domain)?;
        file.flush().await.map_err(to_domain)?;

        debug!(changes = entry.changes.len(), "Appended change log entry");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<ChangeLogEntry>> {
        let path = self.change_log_path();
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(to_domain(err)),
        };

        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ChangeLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(line = index + 1, error = %err, "Skipping unreadable change log line")
                }
            }
        }
        Ok(entries)
    }
}
