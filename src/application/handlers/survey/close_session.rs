//! CloseSession command handler.
//!
//! Compresses a session's transcript into a summary and stores it once per
//! lifecycle. Repeated calls return the stored summary without new inference.
//! Only interactions of the current lifecycle reach the transcript.

use std::sync::Arc;
use thiserror::Error;

use super::{dispatch_audit, SessionLocks};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::survey::SessionSummary;
use crate::ports::{AuditEvent, AuditSink, FeedbackAnalyzer, RepositoryError, SurveyRepository};

/// Errors that can occur when closing a session.
#[derive(Debug, Clone, Error)]
pub enum CloseSessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Handler for end-of-session summaries.
pub struct CloseSessionHandler {
    repository: Arc<dyn SurveyRepository>,
    analyzer: Arc<dyn FeedbackAnalyzer>,
    audit: Arc<dyn AuditSink>,
    locks: Arc<SessionLocks>,
}

impl CloseSessionHandler {
    pub fn new(
        repository: Arc<dyn SurveyRepository>,
        analyzer: Arc<dyn FeedbackAnalyzer>,
        audit: Arc<dyn AuditSink>,
        locks: Arc<SessionLocks>,
    ) -> Self {
        Self {
            repository,
            analyzer,
            audit,
            locks,
        }
    }

    /// Returns the session summary, producing it if this lifecycle has none.
    ///
    /// A fallback summary (inference unavailable) is returned but not stored,
    /// so a later call can still produce a real one.
    pub async fn handle(&self, session_id: &SessionId) -> Result<SessionSummary, CloseSessionError> {
        let _guard = self.locks.acquire(session_id).await;

        let session = self
            .repository
            .find_session(session_id)
            .await?
            .ok_or_else(|| CloseSessionError::NotFound(session_id.clone()))?;

        if let Some(summary) = session.summary() {
            return Ok(summary.clone());
        }

        let history = self.repository.list_interactions(session_id).await?;
        let transcript: Vec<String> = session
            .current_lifecycle(&history)
            .iter()
            .map(|interaction| interaction.transcript_entry())
            .collect();

        let summary = self.analyzer.compress_transcript(&transcript).await;
        if summary.is_fallback() {
            tracing::warn!(session_id = %session_id, "Summary unavailable, not storing fallback");
            return Ok(summary);
        }

        self.repository
            .save_summary(session_id, summary.clone())
            .await?;
        tracing::info!(session_id = %session_id, topics = summary.topics.len(), "Session summarized");

        dispatch_audit(
            &self.audit,
            AuditEvent::SessionSummarized {
                timestamp: Timestamp::now(),
                session_id: session_id.clone(),
                summary: summary.clone(),
            },
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::audit::NoOpAuditSink;
    use crate::adapters::storage::InMemorySurveyRepository;
    use crate::application::{ProcessTurnCommand, ProcessTurnHandler};
    use crate::domain::survey::{Interaction, SentimentResult};
    use crate::ports::RecoveryContext;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct SummarizingAnalyzer {
        summary: SessionSummary,
        calls: AtomicU32,
        last_transcript: Mutex<Vec<String>>,
    }

    impl SummarizingAnalyzer {
        fn returning(summary: SessionSummary) -> Arc<Self> {
            Arc::new(Self {
                summary,
                calls: AtomicU32::new(0),
                last_transcript: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl FeedbackAnalyzer for SummarizingAnalyzer {
        async fn analyze_sentiment(&self, _text: &str) -> SentimentResult {
            SentimentResult::neutral()
        }

        async fn compress_transcript(&self, transcript: &[String]) -> SessionSummary {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_transcript.lock().unwrap() = transcript.to_vec();
            self.summary.clone()
        }

        async fn generate_recovery_message(&self, _context: &RecoveryContext) -> String {
            String::new()
        }

        async fn check_connection(&self) -> bool {
            true
        }
    }

    fn sid(value: &str) -> SessionId {
        SessionId::new(value).unwrap()
    }

    fn real_summary() -> SessionSummary {
        SessionSummary::new(vec!["speed".into()], "none", Map::new())
    }

    async fn seeded_repository(id: &SessionId) -> Arc<InMemorySurveyRepository> {
        let repository = Arc::new(InMemorySurveyRepository::new());
        let session = repository.get_or_create_session(id).await.unwrap();
        let interaction = Interaction::record(id.clone(), "10", SentimentResult::neutral())
            .complete("Fantastic! What feature did you like best?");
        repository.commit_turn(&session, interaction).await.unwrap();
        repository
    }

    fn handler(
        repository: Arc<InMemorySurveyRepository>,
        analyzer: Arc<SummarizingAnalyzer>,
    ) -> CloseSessionHandler {
        CloseSessionHandler::new(
            repository,
            analyzer,
            Arc::new(NoOpAuditSink),
            Arc::new(SessionLocks::new()),
        )
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = handler(
            Arc::new(InMemorySurveyRepository::new()),
            SummarizingAnalyzer::returning(real_summary()),
        );

        let err = handler.handle(&sid("ghost")).await.unwrap_err();

        assert!(matches!(err, CloseSessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn summary_is_built_from_transcript_and_stored() {
        let id = sid("s-1");
        let repository = seeded_repository(&id).await;
        let analyzer = SummarizingAnalyzer::returning(real_summary());
        let handler = handler(repository.clone(), analyzer.clone());

        let summary = handler.handle(&id).await.unwrap();

        assert_eq!(summary, real_summary());
        assert_eq!(
            *analyzer.last_transcript.lock().unwrap(),
            vec!["User: 10\nBot: Fantastic! What feature did you like best?".to_string()]
        );
        let stored = repository.find_session(&id).await.unwrap().unwrap();
        assert_eq!(stored.summary(), Some(&real_summary()));
    }

    #[tokio::test]
    async fn second_call_returns_stored_summary() {
        let id = sid("s-1");
        let repository = seeded_repository(&id).await;
        let analyzer = SummarizingAnalyzer::returning(real_summary());
        let handler = handler(repository, analyzer.clone());

        handler.handle(&id).await.unwrap();
        let again = handler.handle(&id).await.unwrap();

        assert_eq!(again, real_summary());
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_summary_is_not_stored() {
        let id = sid("s-1");
        let repository = seeded_repository(&id).await;
        let analyzer = SummarizingAnalyzer::returning(SessionSummary::fallback());
        let handler = handler(repository.clone(), analyzer.clone());

        let summary = handler.handle(&id).await.unwrap();

        assert!(summary.is_fallback());
        let stored = repository.find_session(&id).await.unwrap().unwrap();
        assert!(stored.summary().is_none());
    }

    #[tokio::test]
    async fn summary_after_restart_leaves_out_previous_lifecycle() {
        let id = sid("s-1");
        let repository = Arc::new(InMemorySurveyRepository::new());
        let analyzer = SummarizingAnalyzer::returning(real_summary());
        let locks = Arc::new(SessionLocks::new());
        let turns = ProcessTurnHandler::new(
            repository.clone(),
            analyzer.clone(),
            Arc::new(NoOpAuditSink),
            locks.clone(),
        )
        .with_message_seed(Some(1));
        let close = CloseSessionHandler::new(
            repository.clone(),
            analyzer.clone(),
            Arc::new(NoOpAuditSink),
            locks,
        );

        for text in ["2", "OLD LIFECYCLE COMPLAINT", "1", "9"] {
            turns.handle(ProcessTurnCommand::new(id.clone(), text)).await;
        }
        assert_eq!(repository.list_interactions(&id).await.unwrap().len(), 4);

        close.handle(&id).await.unwrap();

        let transcript = analyzer.last_transcript.lock().unwrap().clone();
        assert_eq!(transcript.len(), 1);
        assert!(transcript[0].starts_with("User: 9\nBot: "));
        assert!(transcript.iter().all(|entry| !entry.contains("OLD LIFECYCLE COMPLAINT")));
    }
}
