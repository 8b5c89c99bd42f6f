//! Survey repository port.
//!
//! Persists survey sessions and their interaction history.
//!
//! # Design
//!
//! - **Optimistic concurrency**: every write carries the version the caller
//!   read; a mismatch is reported as [`RepositoryError::Conflict`]
//! - **Atomic turns**: `commit_turn` stores the interaction and the new
//!   session state together or not at all
//! - **Append-only history**: interactions are never updated or removed

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::survey::{Interaction, SessionSummary, SurveySession};

/// Errors that can occur during repository operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    /// The stored version moved on since the caller read the session.
    #[error("Concurrent write on session {session_id}: expected version {expected}, found {actual}")]
    Conflict {
        session_id: SessionId,
        expected: u64,
        actual: u64,
    },

    #[error("Summary already written for session {0}")]
    SummaryAlreadyWritten(SessionId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }
}

/// Port for survey session persistence.
///
/// Every method returning a `SurveySession` returns it with the version as
/// stored after the call, so callers can chain writes.
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// Loads a session, creating it at `NpsAsk` if the id was never seen.
    async fn get_or_create_session(&self, id: &SessionId) -> Result<SurveySession, RepositoryError>;

    /// Loads a session without creating it.
    async fn find_session(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError>;

    /// Writes the session's step, score and lifecycle fields.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session was never created
    /// - `Conflict` if `session.version()` differs from the stored version
    async fn update_session_state(&self, session: &SurveySession) -> Result<SurveySession, RepositoryError>;

    /// Appends a completed interaction and writes the session state in one step.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session was never created
    /// - `Conflict` if `session.version()` differs from the stored version;
    ///   nothing is written in that case
    async fn commit_turn(
        &self,
        session: &SurveySession,
        interaction: Interaction,
    ) -> Result<SurveySession, RepositoryError>;

    /// Interactions of a session in arrival order. Empty for unknown ids.
    async fn list_interactions(&self, id: &SessionId) -> Result<Vec<Interaction>, RepositoryError>;

    /// Stores the summary for the session's current lifecycle.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session was never created
    /// - `SummaryAlreadyWritten` if this lifecycle already has one
    async fn save_summary(
        &self,
        id: &SessionId,
        summary: SessionSummary,
    ) -> Result<SurveySession, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SurveyRepository) {}
    }

    #[test]
    fn conflict_is_detectable() {
        let err = RepositoryError::Conflict {
            session_id: SessionId::new("s-1").unwrap(),
            expected: 2,
            actual: 3,
        };
        assert!(err.is_conflict());
        assert!(err.to_string().contains("expected version 2"));
        assert!(!RepositoryError::Storage("disk".into()).is_conflict());
    }
}
