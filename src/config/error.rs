//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid inference URL (must start with http:// or https://)")]
    InvalidInferenceUrl,

    #[error("Inference max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Inference temperature must be within 0.0..=2.0")]
    InvalidTemperature,

    #[error("Invalid database URL (must start with sqlite:)")]
    InvalidDatabaseUrl,

    #[error("Storage max_connections must be within 1..=100")]
    InvalidPoolSize,

    #[error(
        "Worst-case inference latency {worst_case_ms}ms exceeds request timeout {request_timeout_ms}ms"
    )]
    LatencyBudgetExceeded {
        worst_case_ms: u64,
        request_timeout_ms: u64,
    },
}
