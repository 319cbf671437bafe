//! Typed review bookkeeping on top of a [`PreferenceStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{keys, PreferenceStore, Preferences};
use crate::error::StorageError;
use crate::snapshot::ReviewSnapshot;

/// Storage adapter for the review counters.
///
/// Every mutation is a single atomic edit of the underlying store.
#[derive(Clone)]
pub struct ReviewStorage {
    store: Arc<dyn PreferenceStore>,
}

impl ReviewStorage {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Read all counters.
    pub async fn snapshot(&self) -> Result<ReviewSnapshot, StorageError> {
        let prefs = self.store.read().await?;
        snapshot_from(&prefs)
    }

    /// Count a launch. `first_launch_at` is only written if absent.
    pub async fn record_launch(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(move |prefs| {
                if prefs.get(keys::FIRST_LAUNCH_AT)?.is_none() {
                    prefs.set(keys::FIRST_LAUNCH_AT, now);
                }
                let count = prefs.get(keys::LAUNCH_COUNT)?.unwrap_or(0);
                prefs.set(keys::LAUNCH_COUNT, count.saturating_add(1));
                Ok(())
            }))
            .await
    }

    /// A real prompt happened: stamp the cooldown and count it.
    pub async fn record_prompt_shown(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(move |prefs| {
                let count = prefs.get(keys::PROMPT_COUNT)?.unwrap_or(0);
                prefs.set(keys::LAST_PROMPT_AT, now);
                prefs.set(keys::PROMPT_COUNT, count.saturating_add(1));
                Ok(())
            }))
            .await
    }

    /// Result of a review flow, in one edit. Every attempt starts the
    /// cooldown; a completed one also opts out.
    pub async fn record_review_outcome(
        &self,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(move |prefs| {
                if completed {
                    prefs.set(keys::OPT_OUT, true);
                }
                let count = prefs.get(keys::PROMPT_COUNT)?.unwrap_or(0);
                prefs.set(keys::LAST_PROMPT_AT, now);
                prefs.set(keys::PROMPT_COUNT, count.saturating_add(1));
                Ok(())
            }))
            .await
    }

    /// The inline block was shown without interaction.
    pub async fn record_passive_shown(&self, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(move |prefs| {
                let count = prefs.get(keys::PASSIVE_SHOWN_COUNT)?.unwrap_or(0);
                prefs.set(keys::PASSIVE_SHOWN_COUNT, count.saturating_add(1));
                prefs.set(keys::LAST_PASSIVE_SHOWN_AT, now);
                Ok(())
            }))
            .await
    }

    /// Drop both passive impression fields together.
    pub async fn clear_passive_shown(&self) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(|prefs| {
                prefs.remove(keys::PASSIVE_SHOWN_COUNT);
                prefs.remove(keys::LAST_PASSIVE_SHOWN_AT);
                Ok(())
            }))
            .await
    }

    /// Permanent refusal; never cleared.
    pub async fn set_opt_out(&self) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(|prefs| {
                prefs.set(keys::OPT_OUT, true);
                Ok(())
            }))
            .await
    }

    pub async fn set_sentiment(&self, positive: bool) -> Result<(), StorageError> {
        self.store
            .edit(Box::new(move |prefs| {
                prefs.set(keys::SENTIMENT_POSITIVE, positive);
                Ok(())
            }))
            .await
    }
}

fn snapshot_from(prefs: &Preferences) -> Result<ReviewSnapshot, StorageError> {
    Ok(ReviewSnapshot {
        first_launch_at: prefs.get(keys::FIRST_LAUNCH_AT)?,
        launch_count: prefs.get(keys::LAUNCH_COUNT)?.unwrap_or(0),
        last_prompt_at: prefs.get(keys::LAST_PROMPT_AT)?,
        prompt_count: prefs.get(keys::PROMPT_COUNT)?.unwrap_or(0),
        opt_out: prefs.get(keys::OPT_OUT)?.unwrap_or(false),
        sentiment_positive: prefs.get(keys::SENTIMENT_POSITIVE)?,
        passive_shown_count: prefs.get(keys::PASSIVE_SHOWN_COUNT)?.unwrap_or(0),
        last_passive_shown_at: prefs.get(keys::LAST_PASSIVE_SHOWN_AT)?,
    })
}
