//! NPS score value object and the score extractor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Net Promoter Score answer: an integer from 0 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NpsScore(u8);

impl NpsScore {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 10;

    /// Creates a score, returning error if out of range.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::out_of_range(
                "nps_score",
                Self::MIN as i32,
                Self::MAX as i32,
                value as i32,
            ));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Detractor (0-6), passive (7-8) or promoter (9-10).
    pub fn category(&self) -> NpsCategory {
        match self.0 {
            0..=6 => NpsCategory::Detractor,
            7..=8 => NpsCategory::Passive,
            _ => NpsCategory::Promoter,
        }
    }
}

impl TryFrom<u8> for NpsScore {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NpsScore> for u8 {
    fn from(score: NpsScore) -> Self {
        score.0
    }
}

impl fmt::Display for NpsScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NPS respondent bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpsCategory {
    Detractor,
    Passive,
    Promoter,
}

// "10" or a single digit, bounded by word boundaries on both sides so that
// "100" or "42" never yield a truncated score.
static SCORE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(10|[0-9])\b").expect("score pattern is a valid regex"));

/// Returns the first standalone 0-10 integer token in `text`, if any.
///
/// Pure; no score is a normal outcome (the dialogue re-prompts), not an error.
pub fn extract_nps_score(text: &str) -> Option<NpsScore> {
    let token = SCORE_TOKEN.captures(text)?.get(1)?;
    token
        .as_str()
        .parse::<u8>()
        .ok()
        .and_then(|value| NpsScore::new(value).ok())
}
