//! Survey session aggregate and its interactions.

use serde::{Deserialize, Serialize};

use super::dialogue::Transition;
use super::score::NpsScore;
use super::sentiment::{SentimentLabel, SentimentResult};
use super::step::SurveyStep;
use super::summary::SessionSummary;
use crate::domain::foundation::{
    DomainError, ErrorCode, InteractionId, SessionId, StateMachine, Timestamp,
};

/// One survey conversation.
///
/// Sessions are never deleted: a message arriving after `Closing` restarts the
/// same session at `NpsAsk` with a fresh lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySession {
    id: SessionId,
    current_step: SurveyStep,
    nps_score: Option<NpsScore>,
    summary: Option<SessionSummary>,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
    /// Optimistic concurrency counter, bumped by storage on every write.
    version: u64,
}

impl SurveySession {
    /// Creates a session at the first question.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            current_step: SurveyStep::NpsAsk,
            nps_score: None,
            summary: None,
            started_at: Timestamp::now(),
            ended_at: None,
            version: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn current_step(&self) -> SurveyStep {
        self.current_step
    }

    pub fn nps_score(&self) -> Option<NpsScore> {
        self.nps_score
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_closed(&self) -> bool {
        self.current_step.is_terminal()
    }

    /// Resets a closed session to `NpsAsk` and starts a new lifecycle.
    ///
    /// Returns false (and changes nothing) if the session is not closed.
    pub fn restart(&mut self) -> bool {
        if !self.is_closed() {
            return false;
        }
        self.current_step = SurveyStep::NpsAsk;
        self.nps_score = None;
        self.summary = None;
        self.started_at = Timestamp::now();
        self.ended_at = None;
        true
    }

    /// Applies a dialogue decision made from this session's current step.
    pub fn apply(&mut self, transition: &Transition) -> Result<(), DomainError> {
        if transition.from != self.current_step {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Transition was decided from a different step",
            )
            .with_detail("session_step", self.current_step.as_str())
            .with_detail("transition_from", transition.from.as_str()));
        }

        self.current_step = self
            .current_step
            .transition_to(transition.next)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;

        if let Some(score) = transition.nps_score {
            self.nps_score = Some(score);
        }
        if self.current_step == SurveyStep::Closing && self.ended_at.is_none() {
            self.ended_at = Some(Timestamp::now());
        }
        Ok(())
    }

    /// Stores the summary for this lifecycle. Write-once.
    pub fn attach_summary(&mut self, summary: SessionSummary) -> Result<(), DomainError> {
        if self.summary.is_some() {
            return Err(DomainError::new(
                ErrorCode::SummaryAlreadyWritten,
                "Summary already written for this session lifecycle",
            )
            .with_detail("session_id", self.id.as_str()));
        }
        self.summary = Some(summary);
        Ok(())
    }

    /// How long the current lifecycle took to reach `Closing`.
    pub fn survey_duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|ended| ended.duration_since(&self.started_at))
    }

    /// The tail of `interactions` recorded since this lifecycle started.
    ///
    /// `interactions` must be in arrival order, as `list_interactions` returns them.
    pub fn current_lifecycle<'a>(&self, interactions: &'a [Interaction]) -> &'a [Interaction] {
        let start = interactions.partition_point(|i| i.created_at.is_before(&self.started_at));
        &interactions[start..]
    }

    /// Storage-side setter. Only repository adapters should call this.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Rebuilds a session from persisted fields without running any checks.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        current_step: SurveyStep,
        nps_score: Option<NpsScore>,
        summary: Option<SessionSummary>,
        started_at: Timestamp,
        ended_at: Option<Timestamp>,
        version: u64,
    ) -> Self {
        Self {
            id,
            current_step,
            nps_score,
            summary,
            started_at,
            ended_at,
            version,
        }
    }
}

/// User message waiting for the bot's reply.
///
/// Persisting requires [`PendingInteraction::complete`], so no interaction is
/// ever stored with only the user side filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInteraction {
    session_id: SessionId,
    user_input: String,
    sentiment: SentimentResult,
}

impl PendingInteraction {
    pub fn sentiment(&self) -> &SentimentResult {
        &self.sentiment
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// Fills in the bot response.
    pub fn complete(self, bot_response: impl Into<String>) -> Interaction {
        Interaction {
            id: InteractionId::new(),
            session_id: self.session_id,
            user_input: self.user_input,
            bot_response: bot_response.into(),
            sentiment_label: self.sentiment.label,
            sentiment_score: self.sentiment.score,
            created_at: Timestamp::now(),
        }
    }
}

/// One exchange within a session. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub session_id: SessionId,
    pub user_input: String,
    pub bot_response: String,
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f32,
    pub created_at: Timestamp,
}

impl Interaction {
    /// Starts recording an exchange with the classified user input.
    pub fn record(
        session_id: SessionId,
        user_input: impl Into<String>,
        sentiment: SentimentResult,
    ) -> PendingInteraction {
        PendingInteraction {
            session_id,
            user_input: user_input.into(),
            sentiment,
        }
    }

    /// `User: …\nBot: …` rendering used for transcript compression.
    pub fn transcript_entry(&self) -> String {
        format!("User: {}\nBot: {}", self.user_input, self.bot_response)
    }
}

/// True when the two most recent interactions were both frustrated.
pub fn needs_recovery(interactions: &[Interaction]) -> bool {
    interactions.len() >= 2
        && interactions[interactions.len() - 2..]
            .iter()
            .all(|i| i.sentiment_label == SentimentLabel::Frustrated)
}
