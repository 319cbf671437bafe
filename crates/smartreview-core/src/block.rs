//! Renderer-neutral description of the inline review block.
//!
//! The host draws the block however it likes; this module only decides
//! which text and which buttons belong to the current `{ui_state, step}`.

use serde::{Deserialize, Serialize};

use crate::ui::{ReviewStep, ReviewUiAction, ReviewUiState};

/// Text shown by the block. Supplied by the host; the defaults are English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStrings {
    #[serde(default = "default_like_question")]
    pub like_question: String,
    #[serde(default = "default_like_positive")]
    pub like_positive: String,
    #[serde(default = "default_like_negative")]
    pub like_negative: String,
    #[serde(default = "default_rate_question")]
    pub rate_question: String,
    #[serde(default = "default_rate_now")]
    pub rate_now: String,
    #[serde(default = "default_rate_later")]
    pub rate_later: String,
    #[serde(default = "default_rate_never")]
    pub rate_never: String,
}

fn default_like_question() -> String {
    "Are you enjoying the app?".into()
}
fn default_like_positive() -> String {
    "Sure!".into()
}
fn default_like_negative() -> String {
    "Not really".into()
}
fn default_rate_question() -> String {
    "We'd be truly grateful if you could leave a rating on Google Play".into()
}
fn default_rate_now() -> String {
    "Rate app".into()
}
fn default_rate_later() -> String {
    "Maybe later".into()
}
fn default_rate_never() -> String {
    "No, thanks".into()
}

impl Default for ReviewStrings {
    fn default() -> Self {
        Self {
            like_question: default_like_question(),
            like_positive: default_like_positive(),
            like_negative: default_like_negative(),
            rate_question: default_rate_question(),
            rate_now: default_rate_now(),
            rate_later: default_rate_later(),
            rate_never: default_rate_never(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlignment {
    Start,
    #[default]
    Center,
    End,
}

/// Layout hints for the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInlineStyle {
    #[serde(default)]
    pub alignment: HorizontalAlignment,
    /// Gap between title and buttons, in host units.
    #[serde(default = "default_spacing")]
    pub spacing: u16,
}

fn default_spacing() -> u16 {
    12
}

impl Default for ReviewInlineStyle {
    fn default() -> Self {
        Self {
            alignment: HorizontalAlignment::default(),
            spacing: default_spacing(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonEmphasis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewButton {
    pub label: String,
    pub action: ReviewUiAction,
    pub emphasis: ButtonEmphasis,
}

/// What to draw for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewBlock {
    pub step: ReviewStep,
    pub title: String,
    pub buttons: Vec<ReviewButton>,
    pub alignment: HorizontalAlignment,
    pub spacing: u16,
}

impl ReviewBlock {
    /// `None` while the block is hidden.
    pub fn build(
        state: ReviewUiState,
        step: ReviewStep,
        strings: &ReviewStrings,
        style: &ReviewInlineStyle,
    ) -> Option<Self> {
        match state {
            ReviewUiState::Hidden => return None,
            ReviewUiState::Visible => {}
        }

        let (title, buttons) = match step {
            ReviewStep::Sentiment => (
                &strings.like_question,
                vec![
                    button(&strings.like_positive, ReviewUiAction::Like, ButtonEmphasis::Primary),
                    button(
                        &strings.like_negative,
                        ReviewUiAction::Dislike,
                        ButtonEmphasis::Secondary,
                    ),
                ],
            ),
            ReviewStep::AskReview => (
                &strings.rate_question,
                vec![
                    button(&strings.rate_now, ReviewUiAction::RateNow, ButtonEmphasis::Primary),
                    button(
                        &strings.rate_later,
                        ReviewUiAction::RateLater,
                        ButtonEmphasis::Secondary,
                    ),
                    button(
                        &strings.rate_never,
                        ReviewUiAction::RateNever,
                        ButtonEmphasis::Secondary,
                    ),
                ],
            ),
        };

        Some(Self {
            step,
            title: title.clone(),
            buttons,
            alignment: style.alignment,
            spacing: style.spacing,
        })
    }

    /// Button for `action`, if this block offers it.
    pub fn button(&self, action: ReviewUiAction) -> Option<&ReviewButton> {
        self.buttons.iter().find(|b| b.action == action)
    }
}

fn button(label: &str, action: ReviewUiAction, emphasis: ButtonEmphasis) -> ReviewButton {
    ReviewButton {
        label: label.to_string(),
        action,
        emphasis,
    }
}
