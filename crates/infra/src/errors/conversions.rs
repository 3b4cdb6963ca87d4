//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use modsync_domain::ModSyncError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ModSyncError);

impl From<InfraError> for ModSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ModSyncError> for InfraError {
    fn from(value: ModSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoModSyncError {
    fn into_modsync(self) -> ModSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ModSyncError */
/* -------------------------------------------------------------------------- */

impl IntoModSyncError for HttpError {
    fn into_modsync(self) -> ModSyncError {
        if self.is_timeout() {
            return ModSyncError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return ModSyncError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return ModSyncError::InvalidInput(format!("invalid response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => ModSyncError::Auth(message),
                404 => ModSyncError::NotFound(message),
                429 => ModSyncError::RateLimitExceeded(message),
                _ => ModSyncError::Transport(message),
            };
        }

        ModSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_modsync())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → ModSyncError */
/* -------------------------------------------------------------------------- */

impl IntoModSyncError for IoError {
    fn into_modsync(self) -> ModSyncError {
        match self.kind() {
            ErrorKind::NotFound => ModSyncError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                ModSyncError::Persistence(format!("permission denied: {self}"))
            }
            _ => ModSyncError::Persistence(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_modsync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error / toml::de::Error → ModSyncError */
/* -------------------------------------------------------------------------- */

impl IntoModSyncError for JsonError {
    fn into_modsync(self) -> ModSyncError {
        if self.is_io() {
            ModSyncError::Persistence(format!("JSON I/O failure: {self}"))
        } else {
            ModSyncError::InvalidInput(format!("invalid JSON at line {}: {self}", self.line()))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_modsync())
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(ModSyncError::Config(format!("Invalid TOML format: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
