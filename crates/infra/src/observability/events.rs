//! Structured-log sink for schema update events

use modsync_core::SyncEventSink;
use modsync_domain::SchemaUpdateEvent;

/// Target for schema update events
pub const SYNC_EVENT_TARGET: &str = "modsync::sync";

/// Emits one flat `tracing` event per update cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl SyncEventSink for TracingEventSink {
    fn emit(&self, event: &SchemaUpdateEvent) {
        let previous_version = event.previous_version.as_deref().unwrap_or("none");
        let new_version = event.new_version.as_deref().unwrap_or("none");

        if event.success {
            tracing::info!(
                target: SYNC_EVENT_TARGET,
                previous_version,
                new_version,
                updated = event.updated,
                success = event.success,
                change_count = event.change_count,
                breaking_change_count = event.breaking_change_count,
                duration_ms = event.duration_ms,
                timestamp = %event.timestamp,
                "schema_update"
            );
        } else {
            tracing::warn!(
                target: SYNC_EVENT_TARGET,
                previous_version,
                new_version,
                updated = event.updated,
                success = event.success,
                change_count = event.change_count,
                breaking_change_count = event.breaking_change_count,
                duration_ms = event.duration_ms,
                timestamp = %event.timestamp,
                "schema_update"
            );
        }
    }
}
