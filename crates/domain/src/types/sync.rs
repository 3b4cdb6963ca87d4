//! Schema synchronization records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diff::{DetailedChange, DiffAnalysis, DiffSummary};
use super::schema::ValidationRuleDefinition;

/// Outcome of one `update_schema` cycle
///
/// Returned on success and failure alike; failures are described in
/// `errors` rather than surfaced as `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaUpdateResult {
    pub success: bool,
    /// Whether the current schema was replaced
    pub updated: bool,
    pub previous_version: Option<String>,
    pub current_version: Option<String>,
    pub changes: Vec<DetailedChange>,
    pub analysis: Option<DiffAnalysis>,
    pub new_validation_rules: Vec<ValidationRuleDefinition>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl SchemaUpdateResult {
    /// Failed result carrying a single error message
    pub fn failed(previous_version: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            updated: false,
            current_version: previous_version.clone(),
            previous_version,
            changes: Vec::new(),
            analysis: None,
            new_validation_rules: Vec::new(),
            warnings: Vec::new(),
            errors: vec![error.into()],
            duration_ms: 0,
        }
    }

    pub fn breaking_change_count(&self) -> usize {
        self.changes.iter().filter(|c| c.is_breaking()).count()
    }
}

/// Flat observability record emitted once per update cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaUpdateEvent {
    pub previous_version: Option<String>,
    pub new_version: Option<String>,
    pub updated: bool,
    pub success: bool,
    pub change_count: usize,
    pub breaking_change_count: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&SchemaUpdateResult> for SchemaUpdateEvent {
    fn from(result: &SchemaUpdateResult) -> Self {
        Self {
            previous_version: result.previous_version.clone(),
            new_version: result.current_version.clone(),
            updated: result.updated,
            success: result.success,
            change_count: result.changes.len(),
            breaking_change_count: result.breaking_change_count(),
            duration_ms: result.duration_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of an applied schema change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub from_version: String,
    pub to_version: String,
    pub changes: Vec<DetailedChange>,
    pub summary: DiffSummary,
}

impl ChangeLogEntry {
    /// Record the changes and summary of an applied diff
    pub fn from_analysis(analysis: &DiffAnalysis) -> Self {
        Self {
            id: Uuid::now_v7(),
            recorded_at: Utc::now(),
            from_version: analysis.from_version.clone(),
            to_version: analysis.to_version.clone(),
            changes: analysis.changes.clone(),
            summary: analysis.summary.clone(),
        }
    }
}

/// Where the sync service is in its update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Fetching,
    Diffing,
    Validating,
    Persisting,
}

crate::impl_domain_status_conversions!(SyncState {
    Idle => "idle",
    Fetching => "fetching",
    Diffing => "diffing",
    Validating => "validating",
    Persisting => "persisting"
});

impl SyncState {
    /// Decode the `u8` form used for lock-free state storage
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Fetching,
            2 => Self::Diffing,
            3 => Self::Validating,
            4 => Self::Persisting,
            _ => Self::Idle,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Fetching => 1,
            Self::Diffing => 2,
            Self::Validating => 3,
            Self::Persisting => 4,
        }
    }
}

/// Snapshot of the sync service for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub state: SyncState,
    pub current_version: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_state_u8_round_trip() {
        for state in [
            SyncState::Idle,
            SyncState::Fetching,
            SyncState::Diffing,
            SyncState::Validating,
            SyncState::Persisting,
        ] {
            assert_eq!(SyncState::from_u8(state.as_u8()), state);
        }
        assert_eq!(SyncState::from_u8(200), SyncState::Idle);
    }

    #[test]
    fn test_failed_result_keeps_previous_version() {
        let result = SchemaUpdateResult::failed(Some("1.0.0".to_string()), "boom");

        assert!(!result.success);
        assert!(!result.updated);
        assert_eq!(result.current_version.as_deref(), Some("1.0.0"));
        assert_eq!(result.errors, vec!["boom".to_string()]);

        let event = SchemaUpdateEvent::from(&result);
        assert_eq!(event.change_count, 0);
        assert!(!event.success);
    }
}
