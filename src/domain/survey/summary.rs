//! End-of-session compressed summary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker stored as the pain point when compression could not run.
pub const FALLBACK_PAIN_POINT: &str = "Error processing";

/// Structured digest of a finished survey conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Topics the customer brought up.
    pub topics: Vec<String>,
    /// Main issue identified in the transcript.
    pub key_pain_point: String,
    /// Free-form metrics inferred from the text, e.g. `{"nps": 9, "csat": 5}`.
    #[serde(default)]
    pub metrics: Map<String, Value>,
}

impl SessionSummary {
    pub fn new(topics: Vec<String>, key_pain_point: impl Into<String>, metrics: Map<String, Value>) -> Self {
        Self {
            topics,
            key_pain_point: key_pain_point.into(),
            metrics,
        }
    }

    /// Empty-topics summary with the generic pain-point marker.
    pub fn fallback() -> Self {
        Self::new(Vec::new(), FALLBACK_PAIN_POINT, Map::new())
    }

    pub fn is_fallback(&self) -> bool {
        self.topics.is_empty() && self.key_pain_point == FALLBACK_PAIN_POINT && self.metrics.is_empty()
    }
}
