//! Core error types for smartreview-core.
//!
//! Storage failures always propagate to the caller; launch failures are
//! recovered inside the facade and surface only as a `false` result.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for smartreview-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a [`PreferenceStore`](crate::storage::PreferenceStore).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// A persisted value could not be decoded
    #[error("Corrupt value for '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// The blocking worker running the edit panicked or was cancelled
    #[error("Storage task failed: {0}")]
    TaskFailed(String),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors from the terminal review action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    /// No handler is installed for the URI (e.g. the store app is missing)
    #[error("No handler can open {uri}")]
    NotResolvable { uri: String },

    /// The host cannot run this kind of review flow
    #[error("Unsupported review flow: {0}")]
    Unsupported(String),

    /// The flow started but did not complete
    #[error("Review flow failed: {0}")]
    Failed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::TaskFailed(err.to_string())
    }
}
