//! SQLite implementation of SurveyRepository.
//!
//! Sessions live in `survey_sessions`, one row per id. Interactions are
//! appended to `survey_interactions` and read back in insertion order.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::domain::foundation::{InteractionId, SessionId, Timestamp};
use crate::domain::survey::{
    Interaction, NpsScore, SentimentLabel, SessionSummary, SurveySession, SurveyStep,
};
use crate::ports::{RepositoryError, SurveyRepository};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS survey_sessions (
        id TEXT PRIMARY KEY,
        current_step TEXT NOT NULL,
        nps_score INTEGER,
        summary TEXT,
        started_at TEXT NOT NULL,
        ended_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS survey_interactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        session_id TEXT NOT NULL REFERENCES survey_sessions (id),
        user_input TEXT NOT NULL,
        bot_response TEXT NOT NULL,
        sentiment_label TEXT NOT NULL,
        sentiment_score REAL NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_survey_interactions_session
        ON survey_interactions (session_id, seq)
    "#,
];

/// SQLite implementation of SurveyRepository.
#[derive(Clone)]
pub struct SqliteSurveyRepository {
    pool: SqlitePool,
}

impl SqliteSurveyRepository {
    /// Creates a repository over an existing pool. Call [`Self::migrate`] before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url` and applies the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(storage_error("Invalid database url"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(storage_error("Failed to open database"))?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        tracing::info!(database_url = %database_url, "SQLite survey store ready");
        Ok(repository)
    }

    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_error("Failed to apply schema"))?;
        }
        Ok(())
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, current_step, nps_score, summary, started_at, ended_at, version
            FROM survey_sessions
            WHERE id = ?1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error("Failed to fetch session"))?;

        row.map(row_to_session).transpose()
    }

    async fn stored_version(&self, id: &SessionId) -> Result<Option<u64>, RepositoryError> {
        let version: Option<(i64,)> = sqlx::query_as("SELECT version FROM survey_sessions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("Failed to read session version"))?;

        version.map(|(v,)| version_from_db(v)).transpose()
    }
}

#[async_trait]
impl SurveyRepository for SqliteSurveyRepository {
    async fn get_or_create_session(&self, id: &SessionId) -> Result<SurveySession, RepositoryError> {
        let fresh = SurveySession::new(id.clone());
        let result = sqlx::query(
            r#"
            INSERT INTO survey_sessions (id, current_step, nps_score, summary, started_at, ended_at, version)
            VALUES (?1, ?2, NULL, NULL, ?3, NULL, 0)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id.as_str())
        .bind(fresh.current_step().as_str())
        .bind(fresh.started_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to insert session"))?;

        if result.rows_affected() == 1 {
            tracing::info!(session_id = %id, "Created survey session");
        }

        self.fetch_session(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    async fn find_session(&self, id: &SessionId) -> Result<Option<SurveySession>, RepositoryError> {
        self.fetch_session(id).await
    }

    async fn update_session_state(&self, session: &SurveySession) -> Result<SurveySession, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("Failed to start transaction"))?;

        let committed = match write_session(&mut tx, session).await? {
            Some(committed) => committed,
            None => {
                drop(tx);
                return Err(self.write_rejection(session).await);
            }
        };

        tx.commit()
            .await
            .map_err(storage_error("Failed to commit transaction"))?;
        Ok(committed)
    }

    async fn commit_turn(
        &self,
        session: &SurveySession,
        interaction: Interaction,
    ) -> Result<SurveySession, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("Failed to start transaction"))?;

        // Session first: a rejected write leaves the history untouched.
        let committed = match write_session(&mut tx, session).await? {
            Some(committed) => committed,
            None => {
                drop(tx);
                return Err(self.write_rejection(session).await);
            }
        };

        sqlx::query(
            r#"
            INSERT INTO survey_interactions (
                id, session_id, user_input, bot_response,
                sentiment_label, sentiment_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(interaction.id.to_string())
        .bind(interaction.session_id.as_str())
        .bind(&interaction.user_input)
        .bind(&interaction.bot_response)
        .bind(interaction.sentiment_label.as_str())
        .bind(interaction.sentiment_score)
        .bind(interaction.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(storage_error("Failed to insert interaction"))?;

        tx.commit()
            .await
            .map_err(storage_error("Failed to commit transaction"))?;
        Ok(committed)
    }

    async fn list_interactions(&self, id: &SessionId) -> Result<Vec<Interaction>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, user_input, bot_response,
                   sentiment_label, sentiment_score, created_at
            FROM survey_interactions
            WHERE session_id = ?1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error("Failed to list interactions"))?;

        rows.into_iter().map(row_to_interaction).collect()
    }

    async fn save_summary(
        &self,
        id: &SessionId,
        summary: SessionSummary,
    ) -> Result<SurveySession, RepositoryError> {
        let encoded = serde_json::to_string(&summary)
            .map_err(|e| RepositoryError::Storage(format!("Failed to encode summary: {}", e)))?;

        let result = sqlx::query(
            r#"
            UPDATE survey_sessions SET
                summary = ?2,
                version = version + 1
            WHERE id = ?1 AND summary IS NULL
            "#,
        )
        .bind(id.as_str())
        .bind(encoded)
        .execute(&self.pool)
        .await
        .map_err(storage_error("Failed to save summary"))?;

        let stored = self
            .fetch_session(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::SummaryAlreadyWritten(id.clone()));
        }
        Ok(stored)
    }
}

impl SqliteSurveyRepository {
    /// Explains why a version-checked write touched no row.
    async fn write_rejection(&self, session: &SurveySession) -> RepositoryError {
        match self.stored_version(session.id()).await {
            Ok(Some(actual)) => RepositoryError::Conflict {
                session_id: session.id().clone(),
                expected: session.version(),
                actual,
            },
            Ok(None) => RepositoryError::NotFound(session.id().clone()),
            Err(e) => e,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

/// Version-checked session write. `None` when no row matched id and version.
async fn write_session(
    tx: &mut Transaction<'_, Sqlite>,
    session: &SurveySession,
) -> Result<Option<SurveySession>, RepositoryError> {
    let summary = session
        .summary()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| RepositoryError::Storage(format!("Failed to encode summary: {}", e)))?;

    let result = sqlx::query(
        r#"
        UPDATE survey_sessions SET
            current_step = ?3,
            nps_score = ?4,
            summary = ?5,
            started_at = ?6,
            ended_at = ?7,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(session.id().as_str())
    .bind(version_to_db(session.version())?)
    .bind(session.current_step().as_str())
    .bind(session.nps_score().map(|s| i64::from(s.value())))
    .bind(summary)
    .bind(session.started_at().as_datetime())
    .bind(session.ended_at().map(|t| *t.as_datetime()))
    .execute(&mut **tx)
    .await
    .map_err(storage_error("Failed to update session"))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let mut committed = session.clone();
    committed.set_version(session.version() + 1);
    Ok(Some(committed))
}

fn storage_error(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| RepositoryError::Storage(format!("{}: {}", context, e))
}

fn decode_error(column: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("Failed to decode {}: {}", column, e))
}

fn version_to_db(version: u64) -> Result<i64, RepositoryError> {
    i64::try_from(version).map_err(|e| decode_error("version", e))
}

fn version_from_db(version: i64) -> Result<u64, RepositoryError> {
    u64::try_from(version).map_err(|e| decode_error("version", e))
}

fn str_to_step(s: &str) -> Result<SurveyStep, RepositoryError> {
    SurveyStep::ALL
        .into_iter()
        .find(|step| step.as_str() == s)
        .ok_or_else(|| decode_error("current_step", format!("unknown step '{}'", s)))
}

fn row_to_session(row: SqliteRow) -> Result<SurveySession, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
    let step: String = row
        .try_get("current_step")
        .map_err(|e| decode_error("current_step", e))?;
    let nps_score: Option<i64> = row
        .try_get("nps_score")
        .map_err(|e| decode_error("nps_score", e))?;
    let summary: Option<String> = row.try_get("summary").map_err(|e| decode_error("summary", e))?;
    let started_at: chrono::DateTime<chrono::Utc> = row
        .try_get("started_at")
        .map_err(|e| decode_error("started_at", e))?;
    let ended_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("ended_at")
        .map_err(|e| decode_error("ended_at", e))?;
    let version: i64 = row.try_get("version").map_err(|e| decode_error("version", e))?;

    let nps_score = nps_score
        .map(|value| {
            u8::try_from(value)
                .map_err(|e| decode_error("nps_score", e))
                .and_then(|v| NpsScore::new(v).map_err(|e| decode_error("nps_score", e)))
        })
        .transpose()?;
    let summary = summary
        .map(|json| serde_json::from_str::<SessionSummary>(&json))
        .transpose()
        .map_err(|e| decode_error("summary", e))?;

    Ok(SurveySession::reconstitute(
        SessionId::new(id).map_err(|e| decode_error("id", e))?,
        str_to_step(&step)?,
        nps_score,
        summary,
        Timestamp::from_datetime(started_at),
        ended_at.map(Timestamp::from_datetime),
        version_from_db(version)?,
    ))
}

fn row_to_interaction(row: SqliteRow) -> Result<Interaction, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
    let session_id: String = row
        .try_get("session_id")
        .map_err(|e| decode_error("session_id", e))?;
    let label: String = row
        .try_get("sentiment_label")
        .map_err(|e| decode_error("sentiment_label", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| decode_error("created_at", e))?;

    Ok(Interaction {
        id: InteractionId::from_str(&id).map_err(|e| decode_error("id", e))?,
        session_id: SessionId::new(session_id).map_err(|e| decode_error("session_id", e))?,
        user_input: row
            .try_get("user_input")
            .map_err(|e| decode_error("user_input", e))?,
        bot_response: row
            .try_get("bot_response")
            .map_err(|e| decode_error("bot_response", e))?,
        sentiment_label: SentimentLabel::from_str(&label)
            .map_err(|e| decode_error("sentiment_label", e))?,
        sentiment_score: row
            .try_get("sentiment_score")
            .map_err(|e| decode_error("sentiment_score", e))?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
