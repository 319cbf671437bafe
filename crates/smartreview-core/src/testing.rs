//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{LaunchError, StorageError};
use crate::launcher::{ReviewHost, UriTarget};
use crate::storage::{MemoryStore, PreferenceStore, Preferences, Transform};

#[derive(Debug, Clone, Copy)]
enum HostMode {
    Succeed,
    NoStoreApp,
    Fail,
}

/// Records every request and answers according to its mode.
#[derive(Debug)]
pub struct FakeHost {
    mode: HostMode,
    native_calls: AtomicUsize,
    opened: Mutex<Vec<(String, UriTarget)>>,
}

impl FakeHost {
    fn with_mode(mode: HostMode) -> Self {
        Self {
            mode,
            native_calls: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_mode(HostMode::Succeed)
    }

    pub fn without_store_app() -> Self {
        Self::with_mode(HostMode::NoStoreApp)
    }

    pub fn failing() -> Self {
        Self::with_mode(HostMode::Fail)
    }

    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<(String, UriTarget)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReviewHost for FakeHost {
    async fn launch_review_flow(&self) -> Result<(), LaunchError> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            HostMode::Succeed | HostMode::NoStoreApp => Ok(()),
            HostMode::Fail => Err(LaunchError::Failed("review flow cancelled".into())),
        }
    }

    async fn open_uri(&self, uri: &str, target: UriTarget) -> Result<(), LaunchError> {
        self.opened.lock().unwrap().push((uri.to_string(), target));
        match (self.mode, target) {
            (HostMode::Succeed, _) | (HostMode::NoStoreApp, UriTarget::Browser) => Ok(()),
            (HostMode::NoStoreApp, UriTarget::StoreApp) => Err(LaunchError::NotResolvable {
                uri: uri.to_string(),
            }),
            (HostMode::Fail, _) => Err(LaunchError::Failed("no activity".into())),
        }
    }
}

/// A store whose writes can be switched off.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for FlakyStore {
    async fn read(&self) -> Result<Preferences, StorageError> {
        self.inner.read().await
    }

    async fn edit(&self, transform: Transform) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("disk full".into()));
        }
        self.inner.edit(transform).await
    }
}

/// A store whose edits wait before applying, to cancel callers mid-write.
#[derive(Debug)]
pub struct SlowStore {
    inner: MemoryStore,
    delay: std::time::Duration,
}

impl SlowStore {
    pub fn new(prefs: Preferences, delay: std::time::Duration) -> Self {
        Self {
            inner: MemoryStore::with_preferences(prefs),
            delay,
        }
    }
}

#[async_trait]
impl PreferenceStore for SlowStore {
    async fn read(&self) -> Result<Preferences, StorageError> {
        self.inner.read().await
    }

    async fn edit(&self, transform: Transform) -> Result<(), StorageError> {
        tokio::time::sleep(self.delay).await;
        self.inner.edit(transform).await
    }
}
