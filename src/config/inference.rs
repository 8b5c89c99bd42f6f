//! Inference backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::inference::{OllamaConfig, RetryPolicy};

/// Inference backend configuration (Ollama)
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the Ollama host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model tag
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per operation, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles after each failure
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Connectivity probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_json_temperature")]
    pub json_temperature: f32,

    #[serde(default = "default_text_temperature")]
    pub text_temperature: f32,

    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    /// How long the host keeps the model loaded
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,
}

impl InferenceConfig {
    /// Get per-attempt timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.backoff_base_ms),
            self.timeout(),
        )
    }

    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig::new(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout())
            .with_temperatures(self.json_temperature, self.text_temperature)
            .with_limits(self.num_predict, self.num_ctx)
            .with_keep_alive(&self.keep_alive)
    }

    /// Validate inference configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidInferenceUrl);
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("INFERENCE__MODEL"));
        }
        if self.timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        for temperature in [self.json_temperature, self.text_temperature] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ValidationError::InvalidTemperature);
            }
        }
        Ok(())
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            probe_timeout_secs: default_probe_timeout(),
            json_temperature: default_json_temperature(),
            text_temperature: default_text_temperature(),
            num_predict: default_num_predict(),
            num_ctx: default_num_ctx(),
            keep_alive: default_keep_alive(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_json_temperature() -> f32 {
    0.0
}

fn default_text_temperature() -> f32 {
    0.7
}

fn default_num_predict() -> u32 {
    128
}

fn default_num_ctx() -> u32 {
    2048
}

fn default_keep_alive() -> String {
    "5m".to_string()
}
