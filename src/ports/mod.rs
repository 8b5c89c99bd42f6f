//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the survey engine and the outside world. Adapters implement these ports.
//!
//! ## Inference Ports
//!
//! - `InferenceProvider` - Raw completion transport to the LLM host
//! - `FeedbackAnalyzer` - Infallible sentiment, summary and recovery analysis
//!
//! ## Storage Ports
//!
//! - `SurveyRepository` - Sessions and their interaction history
//!
//! ## Audit Ports
//!
//! - `AuditSink` - Structured per-turn and lifecycle records

mod audit_sink;
mod feedback_analyzer;
mod inference;
mod survey_repository;

pub use audit_sink::{AuditError, AuditEvent, AuditSink};
pub use feedback_analyzer::{FeedbackAnalyzer, RecoveryContext, FALLBACK_RECOVERY_MESSAGE};
pub use inference::{
    InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, Message, MessageRole,
    OutputFormat, ProviderInfo,
};
pub use survey_repository::{RepositoryError, SurveyRepository};
