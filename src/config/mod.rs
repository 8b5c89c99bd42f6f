//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SURVEY_ENGINE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use survey_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod inference;
mod server;
mod storage;
mod survey;

pub use error::{ConfigError, ValidationError};
pub use inference::InferenceConfig;
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};
pub use survey::{AuditConfig, SurveyConfig};

use serde::Deserialize;
use std::time::Duration;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// development setup pointed at a local Ollama host.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Inference backend configuration (Ollama)
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Dialogue settings
    #[serde(default)]
    pub survey: SurveyConfig,

    /// Audit log settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Session storage backend
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SURVEY_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SURVEY_ENGINE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `SURVEY_ENGINE__INFERENCE__MODEL=llama3.2` -> `inference.model = llama3.2`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SURVEY_ENGINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Besides per-section checks, the worst-case latency of one retried
    /// inference call must fit inside the HTTP request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.inference.validate()?;
        self.audit.validate()?;
        self.storage.validate()?;

        let worst_case = self.inference.retry_policy().worst_case_latency();
        let request_timeout = self.server.request_timeout();
        if worst_case > request_timeout {
            return Err(ValidationError::LatencyBudgetExceeded {
                worst_case_ms: worst_case.as_millis() as u64,
                request_timeout_ms: request_timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    /// How long a turn may queue behind its session's other turns.
    ///
    /// Whatever the request timeout leaves after a worst-case inference call,
    /// so a queued turn answers with an apology instead of a bare timeout.
    pub fn turn_lock_wait(&self) -> Duration {
        self.server
            .request_timeout()
            .saturating_sub(self.inference.retry_policy().worst_case_latency())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
