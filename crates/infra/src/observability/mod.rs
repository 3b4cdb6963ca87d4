//! Observability infrastructure: tracing setup and sync sinks
//!
//! - [`init_tracing`] installs the process-wide `tracing` subscriber
//! - [`TracingEventSink`] turns each schema update cycle into one structured
//!   event under the `modsync::sync` target
//! - [`LoggingRuleSink`] and [`NoopRuleSink`] stand in for an external module
//!   validator

pub mod events;
pub mod rules;

use modsync_domain::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub use events::{TracingEventSink, SYNC_EVENT_TARGET};
pub use rules::{LoggingRuleSink, NoopRuleSink};

/// Build the filter: `RUST_LOG` when set and valid, the configured level
/// otherwise, `info` as a last resort
fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global tracing subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = build_env_filter(&config.level);

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    match result {
        Ok(()) => tracing::debug!(level = %config.level, json = config.json, "Tracing initialized"),
        Err(e) => tracing::debug!(error = %e, "Tracing subscriber already installed"),
    }
}
