//! Observable state cells.
//!
//! An [`Observable`] holds the latest value of some piece of UI state. Each
//! subscriber first receives the current value, then every later change in
//! emission order, exactly once. Setting a value equal to the current one
//! is not a change and is not emitted.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

struct Inner<T> {
    value: T,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

/// Latest-value cell with fan-out to any number of subscribers.
///
/// Cloning shares the same cell.
pub struct Observable<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: initial,
                subscribers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Values are replaced whole, so a poisoned cell still holds a valid value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Publish `value`. Returns whether it was a change.
    pub fn set(&self, value: T) -> bool {
        let mut inner = self.lock();
        if inner.value == value {
            return false;
        }
        inner.value = value.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
        true
    }

    /// Subscribe; the current value is delivered first.
    ///
    /// Changes queue per subscription until read and the queue is unbounded,
    /// so a subscription that is kept but never drained keeps growing. Drop
    /// it once the values are no longer needed.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Sent under the lock so no change can slip in before the replay.
        let _ = tx.send(inner.value.clone());
        inner.subscribers.push(tx);
        Subscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.lock() {
            Ok(inner) => f.debug_tuple("Observable").field(&inner.value).finish(),
            Err(_) => f.write_str("Observable(<poisoned>)"),
        }
    }
}

/// Receiving end of an [`Observable`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wait for the next value. `None` once the observable is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next value if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Everything queued so far.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            values.push(value);
        }
        values
    }
}
