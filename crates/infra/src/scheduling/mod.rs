//! Scheduling infrastructure for automated schema updates
//!
//! Schedulers follow the same lifecycle rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on every scheduled run

pub mod auto_update;
pub mod error;

pub use auto_update::{AutoUpdateConfig, AutoUpdateScheduler};
pub use error::{SchedulerError, SchedulerResult};
