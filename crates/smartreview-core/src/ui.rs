//! UI-facing state of the inline review block.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether the inline block is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewUiState {
    Hidden,
    Visible,
}

/// Which question the block is asking.
///
/// Ordered: a visible session only moves forward, `Sentiment` to `AskReview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStep {
    /// "Are you enjoying the app?"
    Sentiment,
    /// "Would you rate it?"
    AskReview,
}

/// Something the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewUiAction {
    // Sentiment step
    Like,
    Dislike,
    // Review step
    RateNow,
    RateLater,
    RateNever,
}

impl ReviewUiAction {
    pub const ALL: [ReviewUiAction; 5] = [
        ReviewUiAction::Like,
        ReviewUiAction::Dislike,
        ReviewUiAction::RateNow,
        ReviewUiAction::RateLater,
        ReviewUiAction::RateNever,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewUiAction::Like => "like",
            ReviewUiAction::Dislike => "dislike",
            ReviewUiAction::RateNow => "rate-now",
            ReviewUiAction::RateLater => "rate-later",
            ReviewUiAction::RateNever => "rate-never",
        }
    }

    /// The step on which this action is offered.
    pub fn step(self) -> ReviewStep {
        match self {
            ReviewUiAction::Like | ReviewUiAction::Dislike => ReviewStep::Sentiment,
            ReviewUiAction::RateNow | ReviewUiAction::RateLater | ReviewUiAction::RateNever => {
                ReviewStep::AskReview
            }
        }
    }
}

impl std::fmt::Display for ReviewUiAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewUiAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewUiAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| {
                format!("unknown action '{s}' (expected like, dislike, rate-now, rate-later, rate-never)")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_roundtrip() {
        for action in ReviewUiAction::ALL {
            assert_eq!(action.as_str().parse::<ReviewUiAction>().unwrap(), action);
        }
        assert!("rate".parse::<ReviewUiAction>().is_err());
    }

    #[test]
    fn actions_belong_to_steps() {
        assert_eq!(ReviewUiAction::Like.step(), ReviewStep::Sentiment);
        assert_eq!(ReviewUiAction::RateNever.step(), ReviewStep::AskReview);
        assert!(ReviewStep::Sentiment < ReviewStep::AskReview);
    }
}
