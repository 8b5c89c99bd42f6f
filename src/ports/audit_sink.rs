//! Audit sink port.
//!
//! Structured records of what happened in each survey session. Writes are
//! dispatched in the background; a failing sink never affects a turn.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::survey::{NpsScore, SentimentLabel, SessionSummary, SurveyStep};

/// Errors from an audit sink.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to serialize audit event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One audit record, serialized as a JSON object tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    TurnProcessed {
        timestamp: Timestamp,
        session_id: SessionId,
        user_input: String,
        sentiment: SentimentLabel,
        score: f32,
        bot_response: String,
        step_from: SurveyStep,
        step_to: SurveyStep,
    },
    SessionRestarted {
        timestamp: Timestamp,
        session_id: SessionId,
        previous_score: Option<NpsScore>,
    },
    RecoveryRecommended {
        timestamp: Timestamp,
        session_id: SessionId,
        message: String,
    },
    SessionSummarized {
        timestamp: Timestamp,
        session_id: SessionId,
        summary: SessionSummary,
    },
}

impl AuditEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            AuditEvent::TurnProcessed { session_id, .. }
            | AuditEvent::SessionRestarted { session_id, .. }
            | AuditEvent::RecoveryRecommended { session_id, .. }
            | AuditEvent::SessionSummarized { session_id, .. } => session_id,
        }
    }

    /// Tag used in logs, matching the serialized `event` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::TurnProcessed { .. } => "turn_processed",
            AuditEvent::SessionRestarted { .. } => "session_restarted",
            AuditEvent::RecoveryRecommended { .. } => "recovery_recommended",
            AuditEvent::SessionSummarized { .. } => "session_summarized",
        }
    }
}

/// Port for recording audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}
