mod adapter;
mod config;
pub mod memory;
pub mod prefs;
pub mod sqlite;

pub use adapter::ReviewStorage;
pub use config::Config;
pub use memory::MemoryStore;
pub use prefs::{keys, PrefKey, PrefType, PrefValue, Preferences};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{ConfigError, StorageError};

/// A read-modify-write step applied to the preference set.
///
/// Returning an error aborts the edit; nothing is written.
pub type Transform = Box<dyn FnOnce(&mut Preferences) -> Result<(), StorageError> + Send>;

/// Async key-value persistence.
///
/// Each `edit` is atomic: concurrent readers observe either the state before
/// the transform or the state after it, never a partial write.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Current contents of the store.
    async fn read(&self) -> Result<Preferences, StorageError>;

    /// Apply `transform` atomically.
    async fn edit(&self, transform: Transform) -> Result<(), StorageError>;
}

/// Returns the SmartReview data directory, creating it if needed.
///
/// `SMARTREVIEW_HOME` overrides the location. Otherwise the directory is
/// `~/.config/smartreview[-dev]/`, with the `-dev` suffix selected by
/// `SMARTREVIEW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SMARTREVIEW_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("SMARTREVIEW_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("smartreview-dev")
            } else {
                base_dir.join("smartreview")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
