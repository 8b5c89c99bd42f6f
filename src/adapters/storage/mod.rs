//! Storage Adapters
//!
//! Implementations of the SurveyRepository port.
//!
//! ## Available Adapters
//!
//! - **InMemorySurveyRepository** - Stores sessions in memory, one lock for all writes
//! - **SqliteSurveyRepository** - Stores sessions in a SQLite file via sqlx, one transaction per turn
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::SqliteSurveyRepository;
//!
//! let repository = Arc::new(SqliteSurveyRepository::connect("sqlite://feedback.db", 5).await?);
//! ```

mod in_memory_survey_repository;
mod sqlite_survey_repository;

pub use in_memory_survey_repository::InMemorySurveyRepository;
pub use sqlite_survey_repository::SqliteSurveyRepository;
