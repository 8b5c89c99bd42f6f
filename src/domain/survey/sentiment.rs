//! Sentiment values attached to each user utterance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::score::NpsScore;
use crate::domain::foundation::ValidationError;

/// Coarse sentiment class used by the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SentimentLabel {
    Frustrated,
    Delight,
    #[default]
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frustrated => "Frustrated",
            Self::Delight => "Delight",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; inference backends are not consistent about casing.
impl FromStr for SentimentLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frustrated" => Ok(Self::Frustrated),
            "delight" => Ok(Self::Delight),
            "neutral" => Ok(Self::Neutral),
            other => Err(ValidationError::invalid_format(
                "sentiment_label",
                format!("unknown label '{}'", other),
            )),
        }
    }
}

/// Transient classification of one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Polarity in [-1.0, 1.0].
    pub score: f32,
    pub label: SentimentLabel,
    pub keywords: Vec<String>,
}

impl SentimentResult {
    /// Creates a result, rejecting scores outside [-1, 1] or non-finite values.
    pub fn new(
        score: f32,
        label: SentimentLabel,
        keywords: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
            return Err(ValidationError::invalid_format(
                "sentiment_score",
                format!("{} is outside [-1.0, 1.0]", score),
            ));
        }
        Ok(Self {
            score,
            label,
            keywords,
        })
    }

    /// Neutral result used whenever inference is unavailable.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            keywords: Vec::new(),
        }
    }

    /// Fast path: derive sentiment from an extracted NPS answer without inference.
    ///
    /// The label is always `Neutral`; the score is a linear map of 0..=10 onto
    /// -1.0..=1.0 and only used for reporting.
    pub fn from_nps_score(score: NpsScore) -> Self {
        Self {
            score: f32::from(score.value()) / 5.0 - 1.0,
            label: SentimentLabel::Neutral,
            keywords: Vec::new(),
        }
    }

    pub fn is_frustrated(&self) -> bool {
        self.label == SentimentLabel::Frustrated
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}
