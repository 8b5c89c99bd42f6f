//! HTTP routes for survey endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{analyze, health, service_status, summarize_session, SurveyHandlers};

/// Creates the survey router with all endpoints.
pub fn survey_routes(handlers: SurveyHandlers) -> Router {
    Router::new()
        .route("/", get(service_status))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/sessions/:id/summary", post(summarize_session))
        .with_state(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::audit::NoOpAuditSink;
    use crate::adapters::inference::{
        MockInferenceProvider, ResilientInferenceClient, RetryPolicy,
    };
    use crate::adapters::storage::InMemorySurveyRepository;
    use crate::application::{CloseSessionHandler, ProcessTurnHandler, SessionLocks};
    use crate::ports::{AuditSink, FeedbackAnalyzer, SurveyRepository};

    fn router(provider: MockInferenceProvider) -> Router {
        let repository: Arc<dyn SurveyRepository> = Arc::new(InMemorySurveyRepository::new());
        let analyzer: Arc<dyn FeedbackAnalyzer> = Arc::new(ResilientInferenceClient::new(
            provider,
            RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(200)),
        ));
        let audit: Arc<dyn AuditSink> = Arc::new(NoOpAuditSink);
        let locks = Arc::new(SessionLocks::new());

        let turn = ProcessTurnHandler::new(
            repository.clone(),
            analyzer.clone(),
            audit.clone(),
            locks.clone(),
        )
        .with_message_seed(Some(7));
        let close = CloseSessionHandler::new(repository, analyzer.clone(), audit, locks);

        survey_routes(SurveyHandlers::new(Arc::new(turn), Arc::new(close), analyzer))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_reports_banner() {
        let app = router(MockInferenceProvider::new());
        let (status, body) = send(app, Request::get("/").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "Feedback Bot Online", "mode": "State Machine"})
        );
    }

    #[tokio::test]
    async fn health_reflects_probe() {
        let app = router(MockInferenceProvider::new());
        let (_, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(body["inference_available"], json!(true));

        let app = router(
            MockInferenceProvider::new().with_connection_error(
                crate::ports::InferenceError::unavailable("down"),
            ),
        );
        let (status, body) =
            send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("degraded"));
    }

    #[tokio::test]
    async fn analyze_generates_session_id_when_blank() {
        let app = router(MockInferenceProvider::new());
        let (status, body) = send(
            app,
            post_json("/analyze", json!({"text": "I give it a 10", "session_id": "  "})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let session_id = body["session_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(session_id).is_ok());
        assert_eq!(body["sentiment"], json!("Neutral"));
        assert_eq!(body["recommendation"], Value::Null);
        assert_eq!(body["status"], json!("success"));
    }

    #[tokio::test]
    async fn analyze_keeps_supplied_session_id() {
        let app = router(MockInferenceProvider::new());
        let (_, body) = send(
            app,
            post_json("/analyze", json!({"text": "3", "session_id": "chat-42"})),
        )
        .await;

        assert_eq!(body["session_id"], json!("chat-42"));
        assert_eq!(body["status"], json!("success"));
    }

    #[tokio::test]
    async fn analyze_rejects_missing_text() {
        let app = router(MockInferenceProvider::new());
        let response = app
            .oneshot(post_json("/analyze", json!({"session_id": "abc"})))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn summary_for_unknown_session_is_404() {
        let app = router(MockInferenceProvider::new());
        let (status, body) = send(
            app,
            Request::post("/sessions/nobody/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn summary_after_turn_returns_compressed_transcript() {
        let provider = MockInferenceProvider::new().with_response(
            r#"{"topics": ["speed"], "key_pain_point": "none", "metrics": {"nps": 10}}"#,
        );
        let app = router(provider);

        send(
            app.clone(),
            post_json("/analyze", json!({"text": "10", "session_id": "s-1"})),
        )
        .await;
        let (status, body) = send(
            app,
            Request::post("/sessions/s-1/summary")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topics"], json!(["speed"]));
        assert_eq!(body["metrics"]["nps"], json!(10));
    }
}
