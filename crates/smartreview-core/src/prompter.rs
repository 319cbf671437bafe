//! Review prompter facade.
//!
//! [`SmartReview`] ties storage, policy and the terminal review action
//! together behind the lifecycle API a host calls, and publishes two
//! observable booleans:
//!
//! - `will_show_review`: prediction made at launch of whether the inline
//!   block will appear. The controller re-derives the real answer when it
//!   evaluates.
//! - `is_review_active`: result of the latest eligibility check, cleared as
//!   soon as a prompt or opt-out is recorded.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::StorageError;
use crate::launcher::{ReviewHost, ReviewLauncher};
use crate::observable::Observable;
use crate::policy::{Decision, ReviewPolicy, ReviewPolicyConfig};
use crate::snapshot::ReviewSnapshot;
use crate::storage::{PreferenceStore, ReviewStorage};

/// Lifecycle operations consumed by hosts and by the inline controller.
#[async_trait]
pub trait ReviewPrompter: Send + Sync {
    /// Call once per app start.
    async fn on_app_launched(&self) -> Result<(), StorageError>;

    /// Whether the inline block may be shown right now.
    async fn should_prompt(&self) -> Result<bool, StorageError>;

    async fn mark_sentiment_positive(&self, value: bool) -> Result<(), StorageError>;

    /// Never prompt again.
    async fn mark_opt_out(&self) -> Result<(), StorageError>;

    /// A prompt attempt happened; starts the cooldown.
    async fn mark_prompt_shown(&self) -> Result<(), StorageError>;

    /// The block was shown and not acted on.
    async fn mark_passive_shown(&self) -> Result<(), StorageError>;

    /// The user interacted with the block.
    async fn clear_passive_shows(&self) -> Result<(), StorageError>;

    /// Run the configured review action.
    ///
    /// Returns `Ok(true)` if the flow completed without error. The platform
    /// may still have decided not to show anything.
    async fn request_review(&self, host: &dyn ReviewHost) -> Result<bool, StorageError>;

    fn will_show_review(&self) -> Observable<bool>;

    fn is_review_active(&self) -> Observable<bool>;
}

/// Facade configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartReviewConfig {
    #[serde(default)]
    pub policy: ReviewPolicyConfig,
    #[serde(default)]
    pub launcher: ReviewLauncher,
}

/// Default [`ReviewPrompter`].
pub struct SmartReview {
    state: Arc<State>,
    launcher: ReviewLauncher,
}

/// Everything bookkeeping needs, shareable with detached tasks.
struct State {
    storage: ReviewStorage,
    policy: ReviewPolicy,
    clock: Arc<dyn Clock>,
    will_show_review: Observable<bool>,
    is_review_active: Observable<bool>,
}

impl State {
    async fn decide(&self) -> Result<Decision, StorageError> {
        let snapshot = self.storage.snapshot().await?;
        Ok(self.policy.decide(&snapshot, self.clock.now()))
    }

    async fn recompute_will_show_review(&self) -> Result<(), StorageError> {
        let decision = self.decide().await?;
        self.will_show_review.set(decision.is_eligible());
        Ok(())
    }

    async fn finish_review(&self, completed: bool) -> Result<(), StorageError> {
        self.storage
            .record_review_outcome(completed, self.clock.now())
            .await?;
        self.is_review_active.set(false);
        self.recompute_will_show_review().await
    }
}

impl SmartReview {
    pub fn new(store: Arc<dyn PreferenceStore>, config: SmartReviewConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn PreferenceStore>,
        config: SmartReviewConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Arc::new(State {
                storage: ReviewStorage::new(store),
                policy: ReviewPolicy::new(config.policy),
                clock,
                will_show_review: Observable::new(false),
                is_review_active: Observable::new(false),
            }),
            launcher: config.launcher,
        }
    }

    pub async fn snapshot(&self) -> Result<ReviewSnapshot, StorageError> {
        self.state.storage.snapshot().await
    }

    /// Current decision with its veto reason. Does not touch the observables.
    pub async fn decide(&self) -> Result<Decision, StorageError> {
        self.state.decide().await
    }
}

#[async_trait]
impl ReviewPrompter for SmartReview {
    async fn on_app_launched(&self) -> Result<(), StorageError> {
        let state = &self.state;
        state.storage.record_launch(state.clock.now()).await?;
        state.recompute_will_show_review().await
    }

    async fn should_prompt(&self) -> Result<bool, StorageError> {
        let state = &self.state;
        let snapshot = state.storage.snapshot().await?;
        let decision = state.policy.decide(&snapshot, state.clock.now());
        tracing::debug!(
            first_launch_at = ?snapshot.first_launch_at,
            launch_count = snapshot.launch_count,
            last_prompt_at = ?snapshot.last_prompt_at,
            prompt_count = snapshot.prompt_count,
            opt_out = snapshot.opt_out,
            passive_shown_count = snapshot.passive_shown_count,
            sentiment = ?snapshot.sentiment_positive,
            veto = ?decision.veto(),
            "review eligibility evaluated"
        );
        let eligible = decision.is_eligible();
        state.is_review_active.set(eligible);
        Ok(eligible)
    }

    async fn mark_sentiment_positive(&self, value: bool) -> Result<(), StorageError> {
        self.state.storage.set_sentiment(value).await
    }

    async fn mark_opt_out(&self) -> Result<(), StorageError> {
        self.state.storage.set_opt_out().await?;
        self.state.is_review_active.set(false);
        self.state.recompute_will_show_review().await
    }

    async fn mark_prompt_shown(&self) -> Result<(), StorageError> {
        let state = &self.state;
        state.storage.record_prompt_shown(state.clock.now()).await?;
        state.is_review_active.set(false);
        state.recompute_will_show_review().await
    }

    async fn mark_passive_shown(&self) -> Result<(), StorageError> {
        let state = &self.state;
        state.storage.record_passive_shown(state.clock.now()).await
    }

    async fn clear_passive_shows(&self) -> Result<(), StorageError> {
        self.state.storage.clear_passive_shown().await
    }

    async fn request_review(&self, host: &dyn ReviewHost) -> Result<bool, StorageError> {
        tracing::debug!(launcher = ?self.launcher, "request_review called");

        let completed = match self.launcher.launch(host).await {
            Ok(()) => {
                tracing::info!("review flow completed, applying opt-out and cooldown");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "review flow failed, applying cooldown only");
                false
            }
        };

        // Detached: the outcome is recorded even if the caller is dropped.
        let state = Arc::clone(&self.state);
        tokio::spawn(async move { state.finish_review(completed).await }).await??;
        Ok(completed)
    }

    fn will_show_review(&self) -> Observable<bool> {
        self.state.will_show_review.clone()
    }

    fn is_review_active(&self) -> Observable<bool> {
        self.state.is_review_active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::{days_ms, Veto};
    use crate::storage::MemoryStore;
    use crate::storage::{keys, Preferences};
    use crate::testing::{FakeHost, FlakyStore, SlowStore};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
    }

    fn config(launcher: ReviewLauncher) -> SmartReviewConfig {
        SmartReviewConfig {
            policy: ReviewPolicyConfig {
                min_launch_count: 3,
                min_time_since_first_launch_ms: 0,
                cooldown_ms: days_ms(14),
                max_prompts: 10,
                max_passive_shows: 2,
            },
            launcher,
        }
    }

    fn prompter(launcher: ReviewLauncher) -> (SmartReview, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let prompter = SmartReview::with_clock(
            Arc::new(MemoryStore::new()),
            config(launcher),
            clock.clone(),
        );
        (prompter, clock)
    }

    async fn launch(prompter: &SmartReview, times: u32) {
        for _ in 0..times {
            prompter.on_app_launched().await.unwrap();
        }
    }

    #[tokio::test]
    async fn launch_updates_will_show_review() {
        let (prompter, _clock) = prompter(ReviewLauncher::InApp);
        let mut will_show = prompter.will_show_review().subscribe();

        launch(&prompter, 2).await;
        assert!(!prompter.will_show_review().get());

        launch(&prompter, 1).await;
        assert!(prompter.will_show_review().get());
        assert_eq!(will_show.drain(), vec![false, true]);
    }

    #[tokio::test]
    async fn should_prompt_publishes_is_review_active() {
        let (prompter, _clock) = prompter(ReviewLauncher::InApp);
        launch(&prompter, 3).await;

        assert!(prompter.should_prompt().await.unwrap());
        assert!(prompter.is_review_active().get());

        prompter.mark_prompt_shown().await.unwrap();
        assert!(!prompter.is_review_active().get());
        assert!(!prompter.will_show_review().get());
        assert!(!prompter.should_prompt().await.unwrap());
    }

    #[tokio::test]
    async fn in_app_success_opts_out_and_stamps() {
        let (prompter, _clock) = prompter(ReviewLauncher::InApp);
        launch(&prompter, 3).await;
        let host = FakeHost::succeeding();

        assert!(prompter.request_review(&host).await.unwrap());

        let snapshot = prompter.snapshot().await.unwrap();
        assert!(snapshot.opt_out);
        assert_eq!(snapshot.prompt_count, 1);
        assert_eq!(snapshot.last_prompt_at, Some(t0()));
        assert_eq!(host.native_calls(), 1);
        assert!(!prompter.is_review_active().get());
    }

    #[tokio::test]
    async fn failed_review_only_stamps_cooldown() {
        let (prompter, clock) = prompter(ReviewLauncher::InApp);
        launch(&prompter, 3).await;
        let host = FakeHost::failing();

        assert!(!prompter.request_review(&host).await.unwrap());

        let snapshot = prompter.snapshot().await.unwrap();
        assert!(!snapshot.opt_out);
        assert_eq!(snapshot.prompt_count, 1);
        assert_eq!(
            prompter.decide().await.unwrap(),
            Decision::Ineligible(Veto::CoolingDown)
        );

        clock.advance(Duration::days(14));
        assert!(prompter.should_prompt().await.unwrap());
    }

    #[tokio::test]
    async fn store_listing_success_via_web_fallback() {
        let (prompter, _clock) = prompter(ReviewLauncher::StoreListing {
            package_name: "com.example.app".into(),
        });
        launch(&prompter, 3).await;
        let host = FakeHost::without_store_app();

        assert!(prompter.request_review(&host).await.unwrap());
        assert_eq!(host.opened().len(), 2);

        let snapshot = prompter.snapshot().await.unwrap();
        assert!(snapshot.opt_out);
        assert_eq!(snapshot.prompt_count, 1);
    }

    #[tokio::test]
    async fn store_listing_failure_keeps_user_eligible_later() {
        let (prompter, _clock) = prompter(ReviewLauncher::StoreListing {
            package_name: "com.example.app".into(),
        });
        launch(&prompter, 3).await;

        assert!(!prompter.request_review(&FakeHost::failing()).await.unwrap());
        let snapshot = prompter.snapshot().await.unwrap();
        assert!(!snapshot.opt_out);
        assert_eq!(snapshot.prompt_count, 1);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let store = Arc::new(FlakyStore::new());
        let prompter = SmartReview::with_clock(
            store.clone(),
            config(ReviewLauncher::InApp),
            Arc::new(ManualClock::new(t0())),
        );
        prompter.on_app_launched().await.unwrap();

        store.fail_writes(true);
        assert!(matches!(
            prompter.on_app_launched().await,
            Err(StorageError::QueryFailed(_))
        ));
        assert!(prompter
            .request_review(&FakeHost::succeeding())
            .await
            .is_err());

        store.fail_writes(false);
        assert_eq!(prompter.snapshot().await.unwrap().launch_count, 1);
    }

    #[tokio::test]
    async fn opt_out_is_permanent() {
        let (prompter, clock) = prompter(ReviewLauncher::InApp);
        launch(&prompter, 3).await;
        prompter.mark_opt_out().await.unwrap();

        for _ in 0..5 {
            clock.advance(Duration::days(365));
            prompter.on_app_launched().await.unwrap();
            assert!(!prompter.should_prompt().await.unwrap());
        }
        assert!(!prompter.will_show_review().get());
    }

    #[tokio::test]
    async fn dropped_review_call_still_records_outcome() {
        let mut prefs = Preferences::new();
        prefs.set(keys::FIRST_LAUNCH_AT, t0());
        prefs.set(keys::LAUNCH_COUNT, 3);
        let store = Arc::new(SlowStore::new(prefs, tokio::time::Duration::from_millis(50)));
        let prompter = SmartReview::with_clock(
            store,
            config(ReviewLauncher::InApp),
            Arc::new(ManualClock::new(t0())),
        );
        let host = FakeHost::succeeding();

        let cancelled = tokio::time::timeout(
            tokio::time::Duration::from_millis(20),
            prompter.request_review(&host),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
        let snapshot = prompter.snapshot().await.unwrap();
        assert!(snapshot.opt_out);
        assert_eq!(snapshot.prompt_count, 1);
        assert_eq!(snapshot.last_prompt_at, Some(t0()));
    }
}
