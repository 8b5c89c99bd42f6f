//! ProcessTurn command handler.
//!
//! Runs one survey turn: load or create the session, restart it if it was
//! closed, classify the message, decide the next step, and commit the
//! interaction together with the new state.
//!
//! A turn never fails because inference is down (the analyzer falls back to
//! neutral sentiment). A storage conflict is retried once; any other storage
//! failure yields an apology with status `error`, as does waiting longer than
//! the configured lock wait behind other turns of the same session.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use super::{dispatch_audit, SessionLocks};
use crate::domain::foundation::{DomainError, SessionId, Timestamp};
use crate::domain::survey::{
    decide, extract_nps_score, needs_recovery, Interaction, NpsScore, SentimentLabel,
    SentimentResult, SurveySession, SurveyStep,
};
use crate::ports::{
    AuditEvent, AuditSink, FeedbackAnalyzer, RecoveryContext, RepositoryError, SurveyRepository,
};

/// Message returned when a turn could not be stored.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong on our side. Please send your answer again.";

/// How many recent user messages the recovery prompt sees.
const RECOVERY_CONTEXT_TURNS: usize = 5;

/// Command to process one user message.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub session_id: SessionId,
    pub text: String,
}

impl ProcessTurnCommand {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
        }
    }
}

/// Outcome reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Success,
    Error,
}

/// Result of a turn. Always produced, even when the turn failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub message: String,
    pub sentiment_label: SentimentLabel,
    pub status: TurnStatus,
    /// Step the session is in after this turn; `None` if the turn failed.
    pub step: Option<SurveyStep>,
    pub nps_score: Option<NpsScore>,
}

impl TurnResponse {
    fn failed(session_id: SessionId) -> Self {
        Self {
            session_id,
            message: APOLOGY_MESSAGE.to_string(),
            sentiment_label: SentimentLabel::Neutral,
            status: TurnStatus::Error,
            step: None,
            nps_score: None,
        }
    }
}

/// Errors that abort a single turn attempt.
#[derive(Debug, Clone, Error)]
enum TurnError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TurnError {
    fn is_conflict(&self) -> bool {
        matches!(self, TurnError::Repository(err) if err.is_conflict())
    }
}

/// Handler for survey turns (the feedback processor).
pub struct ProcessTurnHandler {
    repository: Arc<dyn SurveyRepository>,
    analyzer: Arc<dyn FeedbackAnalyzer>,
    audit: Arc<dyn AuditSink>,
    locks: Arc<SessionLocks>,
    rng: Mutex<StdRng>,
    lock_wait: Option<Duration>,
}

impl ProcessTurnHandler {
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
            rng: Mutex::new(StdRng::from_entropy()),
            lock_wait: None,
        }
    }

    /// Seeds message selection; `None` keeps entropy seeding.
    pub fn with_message_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        }
        self
    }

    /// Caps how long a turn queues behind other turns of its session.
    ///
    /// The turn itself is not cut short once it holds the lock, so a stored
    /// turn is never reported as failed.
    pub fn with_lock_wait(mut self, limit: Duration) -> Self {
        self.lock_wait = Some(limit);
        self
    }

    pub async fn handle(&self, cmd: ProcessTurnCommand) -> TurnResponse {
        let acquire = self.locks.acquire(&cmd.session_id);
        let _guard = match self.lock_wait {
            Some(limit) => match tokio::time::timeout(limit, acquire).await {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::warn!(
                        session_id = %cmd.session_id,
                        wait_ms = limit.as_millis() as u64,
                        "Session busy, giving up on queued turn"
                    );
                    return TurnResponse::failed(cmd.session_id.clone());
                }
            },
            None => acquire.await,
        };

        let outcome = match self.run_turn(&cmd).await {
            Err(err) if err.is_conflict() => {
                tracing::warn!(session_id = %cmd.session_id, error = %err, "Storage conflict, retrying turn");
                self.run_turn(&cmd).await
            }
            other => other,
        };

        match outcome {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(session_id = %cmd.session_id, error = %err, "Turn failed");
                TurnResponse::failed(cmd.session_id)
            }
        }
    }

    async fn run_turn(&self, cmd: &ProcessTurnCommand) -> Result<TurnResponse, TurnError> {
        let id = &cmd.session_id;
        let mut session = self.repository.get_or_create_session(id).await?;

        if session.is_closed() {
            let previous_score = session.nps_score();
            session.restart();
            session = self.repository.update_session_state(&session).await?;
            tracing::info!(session_id = %id, "Restarted closed survey session");
            dispatch_audit(
                &self.audit,
                AuditEvent::SessionRestarted {
                    timestamp: Timestamp::now(),
                    session_id: id.clone(),
                    previous_score,
                },
            );
        }

        let step_from = session.current_step();
        let sentiment = self.classify(step_from, &cmd.text).await;
        let pending = Interaction::record(id.clone(), cmd.text.clone(), sentiment);

        let transition = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            decide(step_from, pending.user_input(), pending.sentiment(), &mut *rng)
        };
        session.apply(&transition)?;

        let sentiment = pending.sentiment().clone();
        let interaction = pending.complete(transition.message);
        let committed = self.repository.commit_turn(&session, interaction).await?;

        tracing::debug!(
            session_id = %id,
            from = %step_from,
            to = %committed.current_step(),
            sentiment = %sentiment.label,
            "Processed survey turn"
        );
        if committed.is_closed() {
            tracing::info!(
                session_id = %id,
                nps = ?committed.nps_score().map(|s| s.value()),
                duration_secs = committed.survey_duration().map(|d| d.num_seconds()),
                "Survey completed"
            );
        }

        dispatch_audit(
            &self.audit,
            AuditEvent::TurnProcessed {
                timestamp: Timestamp::now(),
                session_id: id.clone(),
                user_input: cmd.text.clone(),
                sentiment: sentiment.label,
                score: sentiment.score,
                bot_response: transition.message.to_string(),
                step_from,
                step_to: committed.current_step(),
            },
        );

        if sentiment.is_frustrated() {
            self.check_recovery(&committed).await;
        }

        Ok(TurnResponse {
            session_id: id.clone(),
            message: transition.message.to_string(),
            sentiment_label: sentiment.label,
            status: TurnStatus::Success,
            step: Some(committed.current_step()),
            nps_score: committed.nps_score(),
        })
    }

    /// Fast path for NPS answers, inference for everything else.
    async fn classify(&self, step: SurveyStep, text: &str) -> SentimentResult {
        if step == SurveyStep::NpsAsk {
            if let Some(score) = extract_nps_score(text) {
                return SentimentResult::from_nps_score(score);
            }
        }
        self.analyzer.analyze_sentiment(text).await
    }

    /// Spawns recovery generation after two frustrated turns in a row within
    /// the session's current lifecycle.
    async fn check_recovery(&self, session: &SurveySession) {
        let id = session.id();
        let history = match self.repository.list_interactions(id).await {
            Ok(history) => history,
            Err(err) => {
                tracing::warn!(session_id = %id, error = %err, "Could not load history for recovery check");
                return;
            }
        };
        let lifecycle = session.current_lifecycle(&history);
        if !needs_recovery(lifecycle) {
            return;
        }

        let context = RecoveryContext {
            session_id: id.clone(),
            current_step: session.current_step(),
            nps_score: session.nps_score(),
            recent_inputs: lifecycle
                .iter()
                .rev()
                .take(RECOVERY_CONTEXT_TURNS)
                .rev()
                .map(|i| i.user_input.clone())
                .collect(),
        };
        let analyzer = self.analyzer.clone();
        let audit = self.audit.clone();
        tracing::info!(session_id = %id, "Customer frustrated twice in a row, requesting recovery action");

        tokio::spawn(async move {
            let message = analyzer.generate_recovery_message(&context).await;
            dispatch_audit(
                &audit,
                AuditEvent::RecoveryRecommended {
                    timestamp: Timestamp::now(),
                    session_id: context.session_id,
                    message,
                },
            );
        });
    }
}
