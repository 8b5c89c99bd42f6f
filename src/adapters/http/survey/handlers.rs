//! HTTP handlers for survey endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{
    CloseSessionError, CloseSessionHandler, ProcessTurnCommand, ProcessTurnHandler,
};
use crate::domain::foundation::SessionId;
use crate::ports::FeedbackAnalyzer;

use super::dto::{
    AnalyzeRequest, AnalyzeResponse, ErrorResponse, HealthResponse, ServiceStatusResponse,
    SummaryResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SurveyHandlers {
    turn_handler: Arc<ProcessTurnHandler>,
    close_handler: Arc<CloseSessionHandler>,
    analyzer: Arc<dyn FeedbackAnalyzer>,
}

impl SurveyHandlers {
    pub fn new(
        turn_handler: Arc<ProcessTurnHandler>,
        close_handler: Arc<CloseSessionHandler>,
        analyzer: Arc<dyn FeedbackAnalyzer>,
    ) -> Self {
        Self {
            turn_handler,
            close_handler,
            analyzer,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET / - Service banner
pub async fn service_status() -> Json<ServiceStatusResponse> {
    Json(ServiceStatusResponse::online())
}

/// GET /health - Inference connectivity probe
pub async fn health(State(handlers): State<SurveyHandlers>) -> Json<HealthResponse> {
    let available = handlers.analyzer.check_connection().await;
    Json(HealthResponse::from_probe(available))
}

/// POST /analyze - Process one survey turn
///
/// A missing or blank `session_id` starts a new session under a generated id.
/// The turn itself never fails at the HTTP level; storage trouble is reported
/// through `status: "error"` in the body.
pub async fn analyze(
    State(handlers): State<SurveyHandlers>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let session_id = req
        .session_id
        .and_then(|id| SessionId::new(id).ok())
        .unwrap_or_else(SessionId::generate);

    let response = handlers
        .turn_handler
        .handle(ProcessTurnCommand::new(session_id, req.text))
        .await;

    (StatusCode::OK, Json(AnalyzeResponse::from(response))).into_response()
}

/// POST /sessions/:id/summary - Compress the session transcript
pub async fn summarize_session(
    State(handlers): State<SurveyHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match SessionId::new(session_id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request("Invalid session ID")),
            )
                .into_response()
        }
    };

    match handlers.close_handler.handle(&session_id).await {
        Ok(summary) => (StatusCode::OK, Json(SummaryResponse::from(summary))).into_response(),
        Err(e) => handle_close_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_close_error(error: CloseSessionError) -> Response {
    match error {
        CloseSessionError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::not_found("Session", id.as_str())),
        )
            .into_response(),
        CloseSessionError::Repository(err) => {
            tracing::error!(error = %err, "Failed to summarize session");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal("Failed to summarize session")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RepositoryError;

    #[test]
    fn close_error_not_found_maps_to_404() {
        let error = CloseSessionError::NotFound(SessionId::new("missing").unwrap());
        let response = handle_close_error(error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn close_error_storage_maps_to_500() {
        let error = CloseSessionError::Repository(RepositoryError::Storage("disk".to_string()));
        let response = handle_close_error(error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
