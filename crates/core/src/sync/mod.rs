//! Schema synchronization
//!
//! [`SchemaSyncService`] drives one fetch, diff, validate, persist cycle at a
//! time against the ports in [`ports`].

pub mod error;
pub mod ports;
pub mod service;

pub use error::SyncError;
pub use ports::*;
pub use service::SchemaSyncService;
