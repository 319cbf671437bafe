//! Process-local preference store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{PreferenceStore, Preferences, Transform};
use crate::error::StorageError;

/// Preferences held in memory for the lifetime of the value.
///
/// Edits run against a copy and are swapped in only when the transform
/// succeeds. Once the lock is acquired there are no await points, so a
/// dropped caller cannot leave half an edit behind.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prefs: Mutex<Preferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents.
    pub fn with_preferences(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn read(&self) -> Result<Preferences, StorageError> {
        Ok(self.prefs.lock().await.clone())
    }

    async fn edit(&self, transform: Transform) -> Result<(), StorageError> {
        let mut guard = self.prefs.lock().await;
        let mut next = guard.clone();
        transform(&mut next)?;
        *guard = next;
        Ok(())
    }
}
