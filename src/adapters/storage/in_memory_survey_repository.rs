//! In-Memory Survey Repository Adapter
//!
//! Stores sessions and interactions in memory behind a single lock, so a
//! turn commit is atomic with respect to every other call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::survey::{Interaction, SessionSummary, SurveySession};
use crate::ports::{RepositoryError, SurveyRepository};

#[derive(Debug, Default)]
struct Store {
    sessions: HashMap<SessionId, SurveySession>,
    interactions: HashMap<SessionId, Vec<Interaction>>,
}

impl Store {
    /// Replaces the stored session if the caller's version is current.
    fn write_session(&mut self, session: &SurveySession) -> Result<SurveySession, RepositoryError> {
        let stored = self
            .sessions
            .get_mut(session.id())
            .ok_or_else(|| RepositoryError::NotFound(session.id().clone()))?;

        if stored.version() != session.version() {
            return Err(RepositoryError::Conflict {
                session_id: session.id().clone(),
                expected: session.version(),
                actual: stored.version(),
            });
        }

        let mut next = session.clone();
        next.set_version(stored.version() + 1);
        *stored = next.clone();
        Ok(next)
    }
}

/// In-memory storage for survey sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySurveyRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemorySurveyRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.store.read().await.sessions.len()
    }
}

#[async_trait]
impl SurveyRepository for InMemorySurveyRepository {
    async fn get_or_create_session(&self, id: &SessionId) -> Result<SurveySession, RepositoryError> {
        if let Some(session) = self.store.read().await.sessions.get(id) {
            return Ok(session.clone());
        }

        let mut store = self.store.write().await;
        let session = store
            .sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::info!(session_id = %id, "Created survey session");
                SurveySession::new(id.clone())
            })
            .clone();
        Ok(session)
    }

    async fn find_session(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        Ok(self.store.read().await.sessions.get(id).cloned())
    }

    async fn update_session_state(&self, session: &SurveySession) -> Result<SurveySession, RepositoryError> {
        self.store.write().await.write_session(session)
    }

    async fn commit_turn(
        &self,
        session: &SurveySession,
        interaction: Interaction,
    ) -> Result<SurveySession, RepositoryError> {
        let mut store = self.store.write().await;
        // Session first: a conflict must leave the history untouched.
        let committed = store.write_session(session)?;
        store
            .interactions
            .entry(session.id().clone())
            .or_default()
            .push(interaction);
        Ok(committed)
    }

    async fn list_interactions(&self, id: &SessionId) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self
            .store
            .read()
            .await
            .interactions
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_summary(
        &self,
        id: &SessionId,
        summary: SessionSummary,
    ) -> Result<SurveySession, RepositoryError> {
        let mut store = self.store.write().await;
        let stored = store
            .sessions
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        stored
            .attach_summary(summary)
            .map_err(|_| RepositoryError::SummaryAlreadyWritten(id.clone()))?;
        let version = stored.version() + 1;
        stored.set_version(version);
        Ok(stored.clone())
    }
}
