//! Inline review controller.
//!
//! Drives the two-step block. The host calls [`evaluate`] each time the
//! block is mounted and forwards button presses to [`on_action`] (or
//! [`submit`], which also runs the review action for "rate now").
//!
//! ## State Transitions
//!
//! ```text
//! Hidden --evaluate (eligible twice)--> Visible/Sentiment
//! Visible/Sentiment --Like--> Visible/AskReview
//! any --Dislike | RateNow | RateLater | RateNever--> Hidden
//! ```
//!
//! Calls on one controller never interleave: each holds the controller's
//! lock until its storage writes are done. The writes run on a spawned task,
//! so a caller dropped mid-await (the block torn down) does not abandon them.
//!
//! [`evaluate`]: ReviewInlineController::evaluate
//! [`on_action`]: ReviewInlineController::on_action
//! [`submit`]: ReviewInlineController::submit

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::block::{ReviewBlock, ReviewInlineStyle, ReviewStrings};
use crate::error::StorageError;
use crate::launcher::ReviewHost;
use crate::observable::Observable;
use crate::prompter::ReviewPrompter;
use crate::ui::{ReviewStep, ReviewUiAction, ReviewUiState};

pub struct ReviewInlineController {
    shared: Shared,
    flight: Arc<Mutex<()>>,
}

/// Handles the detached work runs against.
#[derive(Clone)]
struct Shared {
    prompter: Arc<dyn ReviewPrompter>,
    ui_state: Observable<ReviewUiState>,
    step: Observable<ReviewStep>,
}

impl ReviewInlineController {
    pub fn new(prompter: Arc<dyn ReviewPrompter>) -> Self {
        Self {
            shared: Shared {
                prompter,
                ui_state: Observable::new(ReviewUiState::Hidden),
                step: Observable::new(ReviewStep::Sentiment),
            },
            flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn ui_state(&self) -> Observable<ReviewUiState> {
        self.shared.ui_state.clone()
    }

    pub fn step(&self) -> Observable<ReviewStep> {
        self.shared.step.clone()
    }

    /// The block to draw for the current state.
    pub fn block(&self, strings: &ReviewStrings, style: &ReviewInlineStyle) -> Option<ReviewBlock> {
        ReviewBlock::build(
            self.shared.ui_state.get(),
            self.shared.step.get(),
            strings,
            style,
        )
    }

    /// Decide whether the block is shown, counting the impression.
    ///
    /// The impression is recorded before the final check, so the impression
    /// that reaches the passive limit already hides the block. Any storage
    /// failure leaves the block hidden.
    pub async fn evaluate(&self) -> Result<ReviewUiState, StorageError> {
        let flight = Arc::clone(&self.flight).lock_owned().await;
        let shared = self.shared.clone();
        let (_flight, state) = detached(flight, async move { shared.evaluate().await }).await?;
        Ok(state)
    }

    /// Apply a button press.
    ///
    /// `RateNow` only hides the block; the caller runs the review action
    /// afterwards, or uses [`submit`](Self::submit).
    pub async fn on_action(&self, action: ReviewUiAction) -> Result<(), StorageError> {
        let flight = Arc::clone(&self.flight).lock_owned().await;
        let shared = self.shared.clone();
        detached(flight, async move { shared.on_action(action).await }).await?;
        Ok(())
    }

    /// Apply a button press and, for `RateNow`, run the review action.
    ///
    /// Returns the review result for `RateNow`, `None` for other actions.
    pub async fn submit(
        &self,
        action: ReviewUiAction,
        host: &dyn ReviewHost,
    ) -> Result<Option<bool>, StorageError> {
        let flight = Arc::clone(&self.flight).lock_owned().await;
        let shared = self.shared.clone();
        let (_flight, ()) = detached(flight, async move { shared.on_action(action).await }).await?;

        match action {
            ReviewUiAction::RateNow => {
                let completed = self.shared.prompter.request_review(host).await?;
                Ok(Some(completed))
            }
            ReviewUiAction::Like
            | ReviewUiAction::Dislike
            | ReviewUiAction::RateLater
            | ReviewUiAction::RateNever => Ok(None),
        }
    }
}

/// Run `work` on its own task so that dropping the caller cannot cut a
/// sequence of storage writes short. The task owns the flight guard until
/// the work is done, then hands it back.
async fn detached<T, F>(
    flight: OwnedMutexGuard<()>,
    work: F,
) -> Result<(OwnedMutexGuard<()>, T), StorageError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StorageError>> + Send + 'static,
{
    let (flight, result) = tokio::spawn(async move {
        let result = work.await;
        (flight, result)
    })
    .await?;
    Ok((flight, result?))
}

impl Shared {
    async fn evaluate(&self) -> Result<ReviewUiState, StorageError> {
        tracing::debug!("evaluate() called");

        let result = self.evaluate_checked().await;
        if result.is_err() {
            self.hide("storage error");
        }
        result
    }

    async fn evaluate_checked(&self) -> Result<ReviewUiState, StorageError> {
        if !self.prompter.should_prompt().await? {
            self.hide("not eligible");
            return Ok(ReviewUiState::Hidden);
        }

        self.prompter.mark_passive_shown().await?;

        if self.prompter.should_prompt().await? {
            self.step.set(ReviewStep::Sentiment);
            self.ui_state.set(ReviewUiState::Visible);
            tracing::debug!("UI -> Visible, step = Sentiment");
            Ok(ReviewUiState::Visible)
        } else {
            self.hide("limit reached after increment");
            Ok(ReviewUiState::Hidden)
        }
    }

    async fn on_action(&self, action: ReviewUiAction) -> Result<(), StorageError> {
        tracing::debug!(%action, "on_action");

        let result = self.apply(action).await;
        if result.is_err() {
            self.hide("storage error");
        }
        result
    }

    async fn apply(&self, action: ReviewUiAction) -> Result<(), StorageError> {
        self.prompter.clear_passive_shows().await?;

        match action {
            ReviewUiAction::Like => {
                self.prompter.mark_sentiment_positive(true).await?;
                self.step.set(ReviewStep::AskReview);
                tracing::debug!("step -> AskReview");
            }
            ReviewUiAction::Dislike => {
                self.prompter.mark_sentiment_positive(false).await?;
                self.prompter.mark_opt_out().await?;
                self.hide("opt-out");
            }
            ReviewUiAction::RateNow => {
                self.hide("waiting for review flow");
            }
            ReviewUiAction::RateLater => {
                self.prompter.mark_prompt_shown().await?;
                self.hide("cooldown");
            }
            ReviewUiAction::RateNever => {
                self.prompter.mark_opt_out().await?;
                self.hide("opt-out");
            }
        }
        Ok(())
    }

    fn hide(&self, reason: &str) {
        self.ui_state.set(ReviewUiState::Hidden);
        tracing::debug!(reason, "UI -> Hidden");
    }
}
