use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted usage facts at one point in time.
///
/// Rebuilt from storage for every decision and never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    /// First recorded launch. `None` until the first launch completes.
    pub first_launch_at: Option<DateTime<Utc>>,
    pub launch_count: u32,
    /// Last native dialog or store-page open.
    pub last_prompt_at: Option<DateTime<Utc>>,
    pub prompt_count: u32,
    /// Permanent refusal. Never reset once set.
    pub opt_out: bool,
    pub sentiment_positive: Option<bool>,
    /// Inline impressions the user has not acted on yet.
    pub passive_shown_count: u32,
    pub last_passive_shown_at: Option<DateTime<Utc>>,
}
