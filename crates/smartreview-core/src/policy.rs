//! Review eligibility policy.
//!
//! A pure decision over a [`ReviewSnapshot`] and an explicit `now`. The
//! engine never reads the clock so the same inputs always give the same
//! answer.
//!
//! ## Veto order
//!
//! ```text
//! OptedOut -> NeverLaunched -> TooSoonAfterFirstLaunch -> NotEnoughLaunches
//!   -> PromptLimitReached -> PassiveLimitReached -> CoolingDown -> Eligible
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::ReviewSnapshot;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Milliseconds in `days` days.
pub const fn days_ms(days: u64) -> u64 {
    days * DAY_MS
}

/// Thresholds controlling when the inline review block may appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPolicyConfig {
    #[serde(default = "default_min_launch_count")]
    pub min_launch_count: u32,
    #[serde(default = "default_min_time_since_first_launch_ms")]
    pub min_time_since_first_launch_ms: u64,
    /// Minimum gap between two real prompts.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Lifetime cap on real prompts.
    #[serde(default = "default_max_prompts")]
    pub max_prompts: u32,
    /// Unanswered impressions tolerated before the block is suppressed.
    #[serde(default = "default_max_passive_shows")]
    pub max_passive_shows: u32,
}

fn default_min_launch_count() -> u32 {
    3
}
fn default_min_time_since_first_launch_ms() -> u64 {
    days_ms(2)
}
fn default_cooldown_ms() -> u64 {
    days_ms(14)
}
fn default_max_prompts() -> u32 {
    10
}
fn default_max_passive_shows() -> u32 {
    2
}

impl Default for ReviewPolicyConfig {
    fn default() -> Self {
        Self {
            min_launch_count: default_min_launch_count(),
            min_time_since_first_launch_ms: default_min_time_since_first_launch_ms(),
            cooldown_ms: default_cooldown_ms(),
            max_prompts: default_max_prompts(),
            max_passive_shows: default_max_passive_shows(),
        }
    }
}

/// Why a snapshot is not eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Veto {
    OptedOut,
    NeverLaunched,
    TooSoonAfterFirstLaunch,
    NotEnoughLaunches,
    PromptLimitReached,
    PassiveLimitReached,
    CoolingDown,
}

impl Veto {
    pub fn as_str(self) -> &'static str {
        match self {
            Veto::OptedOut => "opted_out",
            Veto::NeverLaunched => "never_launched",
            Veto::TooSoonAfterFirstLaunch => "too_soon_after_first_launch",
            Veto::NotEnoughLaunches => "not_enough_launches",
            Veto::PromptLimitReached => "prompt_limit_reached",
            Veto::PassiveLimitReached => "passive_limit_reached",
            Veto::CoolingDown => "cooling_down",
        }
    }
}

impl std::fmt::Display for Veto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "veto", rename_all = "snake_case")]
pub enum Decision {
    Eligible,
    Ineligible(Veto),
}

impl Decision {
    pub fn is_eligible(self) -> bool {
        matches!(self, Decision::Eligible)
    }

    pub fn veto(self) -> Option<Veto> {
        match self {
            Decision::Eligible => None,
            Decision::Ineligible(veto) => Some(veto),
        }
    }
}

/// Pure review eligibility policy.
#[derive(Debug, Clone, Default)]
pub struct ReviewPolicy {
    config: ReviewPolicyConfig,
}

impl ReviewPolicy {
    pub fn new(config: ReviewPolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReviewPolicyConfig {
        &self.config
    }

    /// Whether the inline block may be shown at `now`.
    pub fn should_prompt(&self, snapshot: &ReviewSnapshot, now: DateTime<Utc>) -> bool {
        self.decide(snapshot, now).is_eligible()
    }

    /// Evaluate every veto in order and report the first one that applies.
    pub fn decide(&self, snapshot: &ReviewSnapshot, now: DateTime<Utc>) -> Decision {
        let config = &self.config;

        if snapshot.opt_out {
            return Decision::Ineligible(Veto::OptedOut);
        }

        let Some(first_launch_at) = snapshot.first_launch_at else {
            return Decision::Ineligible(Veto::NeverLaunched);
        };

        if is_within(first_launch_at, now, config.min_time_since_first_launch_ms) {
            return Decision::Ineligible(Veto::TooSoonAfterFirstLaunch);
        }

        if snapshot.launch_count < config.min_launch_count {
            return Decision::Ineligible(Veto::NotEnoughLaunches);
        }

        if snapshot.prompt_count >= config.max_prompts {
            return Decision::Ineligible(Veto::PromptLimitReached);
        }

        if snapshot.passive_shown_count >= config.max_passive_shows {
            return Decision::Ineligible(Veto::PassiveLimitReached);
        }

        if let Some(last_prompt_at) = snapshot.last_prompt_at {
            if is_within(last_prompt_at, now, config.cooldown_ms) {
                return Decision::Ineligible(Veto::CoolingDown);
            }
        }

        Decision::Eligible
    }
}

/// `now - since < window`. A clock that moved backwards counts as within.
fn is_within(since: DateTime<Utc>, now: DateTime<Utc>, window_ms: u64) -> bool {
    let elapsed_ms = (now - since).num_milliseconds();
    let window_ms = i64::try_from(window_ms).unwrap_or(i64::MAX);
    elapsed_ms < window_ms
}
