//! # SmartReview Core Library
//!
//! Decides when an application should ask its user for a store review, and
//! drives a small two-step inline block ("Enjoying the app?" then "Rate
//! us?") that replaces a modal dialog.
//!
//! ## Architecture
//!
//! - **Policy**: a pure function from a persisted [`ReviewSnapshot`] and the
//!   current time to an eligibility [`Decision`]
//! - **Storage**: typed preference keys over an async [`PreferenceStore`],
//!   backed by SQLite or memory, plus TOML host configuration
//! - **Prompter**: the [`SmartReview`] facade the host calls on launch and
//!   when the user acts
//! - **Controller**: the [`ReviewInlineController`] state machine behind the
//!   inline block
//!
//! ## Key Components
//!
//! - [`ReviewPolicy`]: eligibility rules
//! - [`SmartReview`]: lifecycle API and observables
//! - [`ReviewInlineController`]: `Hidden` / `Visible` with `Sentiment` and
//!   `AskReview` steps
//! - [`ReviewLauncher`]: in-app flow or store listing, run through a
//!   [`ReviewHost`]

pub mod block;
pub mod clock;
pub mod controller;
pub mod error;
pub mod launcher;
pub mod observable;
pub mod policy;
pub mod prompter;
pub mod snapshot;
pub mod storage;
pub mod ui;

#[cfg(test)]
mod testing;

pub use block::{ButtonEmphasis, HorizontalAlignment, ReviewBlock, ReviewButton, ReviewInlineStyle, ReviewStrings};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::ReviewInlineController;
pub use error::{ConfigError, CoreError, LaunchError, StorageError};
pub use launcher::{DesktopHost, ReviewHost, ReviewLauncher, UriTarget};
pub use observable::{Observable, Subscription};
pub use policy::{Decision, ReviewPolicy, ReviewPolicyConfig, Veto};
pub use prompter::{ReviewPrompter, SmartReview, SmartReviewConfig};
pub use snapshot::ReviewSnapshot;
pub use storage::{Config, MemoryStore, PreferenceStore, ReviewStorage, SqliteStore};
pub use ui::{ReviewStep, ReviewUiAction, ReviewUiState};
