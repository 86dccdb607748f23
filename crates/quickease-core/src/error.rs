//! Core error types for quickease-core.
//!
//! The timer engine and the achievement rules are total and never fail.
//! Everything that talks to the outside world (the REST backend, the local
//! SQLite cache, the TOML config) reports through this hierarchy.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quickease-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Remote backend errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Local cache errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the REST backend client.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connection refused, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// No access token is held; the user must log in first.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The access token was rejected and refreshing it failed.
    /// Callers are expected to force a logout.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// A request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// Base URL could not be parsed or joined.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Local cache errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt value for key '{key}': {message}")]
    CorruptValue { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl BackendError {
    /// Whether the user has to log in again before any further call can work.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, BackendError::NotAuthenticated | BackendError::SessionExpired)
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_formats_request_context() {
        let err = BackendError::Status {
            method: "POST".into(),
            path: "achievements/".into(),
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "POST achievements/ returned HTTP 500: boom");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn backend_error_converts_into_core_error() {
        let core: CoreError = BackendError::SessionExpired.into();
        assert!(matches!(core, CoreError::Backend(BackendError::SessionExpired)));
    }
}
