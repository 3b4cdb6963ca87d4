//! Sync service errors

use modsync_common::{ErrorClassification, ErrorSeverity};
use modsync_domain::ModSyncError;
use thiserror::Error;

use crate::schema::SchemaValidationIssue;

/// Failures of one schema update cycle
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Schema update already in progress")]
    ConcurrentUpdate,

    #[error("Failed to fetch schema: {0}")]
    Fetch(#[source] ModSyncError),

    #[error("Schema validation failed: {}", join_issues(.0))]
    Validation(Vec<SchemaValidationIssue>),

    #[error("Failed to persist schema: {0}")]
    Persistence(#[source] ModSyncError),

    #[error("No current schema loaded")]
    NoCurrentSchema,
}

fn join_issues(issues: &[SchemaValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl ErrorClassification for SyncError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch(ModSyncError::Network(_) | ModSyncError::Transport(_))
                | Self::Persistence(_)
        )
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConcurrentUpdate | Self::NoCurrentSchema => ErrorSeverity::Info,
            Self::Fetch(_) => ErrorSeverity::Warning,
            Self::Validation(_) => ErrorSeverity::Error,
            Self::Persistence(_) => ErrorSeverity::Critical,
        }
    }
}

impl From<SyncError> for ModSyncError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::ConcurrentUpdate => ModSyncError::ConcurrentUpdate,
            SyncError::Fetch(inner) | SyncError::Persistence(inner) => inner,
            SyncError::Validation(issues) => ModSyncError::SchemaValidation(join_issues(&issues)),
            SyncError::NoCurrentSchema => {
                ModSyncError::NotFound("no current schema loaded".to_string())
            }
        }
    }
}
