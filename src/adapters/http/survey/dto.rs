//! HTTP DTOs for survey endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::{TurnResponse, TurnStatus};
use crate::domain::survey::{SentimentLabel, SessionSummary};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One user message, optionally tied to an existing session.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Banner returned from `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatusResponse {
    pub status: &'static str,
    pub mode: &'static str,
}

impl ServiceStatusResponse {
    pub fn online() -> Self {
        Self {
            status: "Feedback Bot Online",
            mode: "State Machine",
        }
    }
}

/// Connectivity probe result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub inference_available: bool,
}

impl HealthResponse {
    pub fn from_probe(inference_available: bool) -> Self {
        Self {
            status: if inference_available { "ok" } else { "degraded" },
            inference_available,
        }
    }
}

/// Reply to a survey turn.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub message: String,
    pub sentiment: SentimentLabel,
    /// Recovery actions are delivered to the audit log, never inline.
    pub recommendation: Option<String>,
    pub status: TurnStatus,
}

impl From<TurnResponse> for AnalyzeResponse {
    fn from(turn: TurnResponse) -> Self {
        Self {
            session_id: turn.session_id.to_string(),
            message: turn.message,
            sentiment: turn.sentiment_label,
            recommendation: None,
            status: turn.status,
        }
    }
}

/// Compressed end-of-session summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub topics: Vec<String>,
    pub key_pain_point: String,
    pub metrics: Map<String, Value>,
}

impl From<SessionSummary> for SummaryResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            topics: summary.topics,
            key_pain_point: summary.key_pain_point,
            metrics: summary.metrics,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("{} not found: {}", resource_type, id),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
