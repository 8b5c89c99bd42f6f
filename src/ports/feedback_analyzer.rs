//! Feedback Analyzer Port - Inference-backed analysis of survey text.
//!
//! Every method is infallible from the caller's point of view. Implementations
//! absorb timeouts, transport failures and malformed output, and return a
//! typed fallback instead:
//!
//! | Operation                   | Fallback                                         |
//! |-----------------------------|--------------------------------------------------|
//! | `analyze_sentiment`         | neutral sentiment, score 0.0, no keywords        |
//! | `compress_transcript`       | no topics, pain point `"Error processing"`       |
//! | `generate_recovery_message` | `"Escalate to human agent immediately."`         |
//! | `check_connection`          | `false`                                          |

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::SessionId;
use crate::domain::survey::{NpsScore, SentimentResult, SessionSummary, SurveyStep};

/// Recovery message returned when generation is unavailable.
pub const FALLBACK_RECOVERY_MESSAGE: &str = "Escalate to human agent immediately.";

/// Port for sentiment, summarization and recovery inference.
#[async_trait]
pub trait FeedbackAnalyzer: Send + Sync {
    /// Classifies free text.
    async fn analyze_sentiment(&self, text: &str) -> SentimentResult;

    /// Summarizes a transcript given as one `User: …\nBot: …` entry per interaction.
    async fn compress_transcript(&self, transcript: &[String]) -> SessionSummary;

    /// Suggests a short action for a support agent when a customer is frustrated.
    async fn generate_recovery_message(&self, context: &RecoveryContext) -> String;

    /// Connectivity probe, bounded by a short timeout and never retried.
    async fn check_connection(&self) -> bool;
}

/// What the recovery prompt gets to see about a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryContext {
    pub session_id: SessionId,
    pub current_step: SurveyStep,
    pub nps_score: Option<NpsScore>,
    /// Most recent user messages, oldest first.
    pub recent_inputs: Vec<String>,
}
