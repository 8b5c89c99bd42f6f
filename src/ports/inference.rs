//! Inference Provider Port - Interface for the remote text-inference backend.
//!
//! This port abstracts the raw request/response exchange with an LLM host
//! (Ollama, or anything speaking a compatible API). It deliberately has no
//! retry or fallback behavior: that lives in the resilient client, which
//! wraps any `InferenceProvider`.
//!
//! # Example
//!
//! ```ignore
//! let request = InferenceRequest::json()
//!     .with_system_prompt("Classify the sentiment...")
//!     .with_user_message("The agent was rude.");
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port for remote text inference.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Runs a single non-streaming completion.
    async fn complete(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError>;

    /// Cheap reachability check, bounded by `timeout`.
    async fn check_connection(&self, timeout: Duration) -> Result<(), InferenceError>;

    /// Provider name and model, for logs.
    fn provider_info(&self) -> ProviderInfo;
}

/// Shape the caller expects the completion text to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single JSON object.
    Json,
    /// Free text.
    Text,
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Conversation messages, in order.
    pub messages: Vec<Message>,
    /// Expected output shape.
    pub format: OutputFormat,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl InferenceRequest {
    /// Creates a request expecting a JSON object back.
    pub fn json() -> Self {
        Self::with_format(OutputFormat::Json)
    }

    /// Creates a request expecting free text back.
    pub fn text() -> Self {
        Self::with_format(OutputFormat::Text)
    }

    fn with_format(format: OutputFormat) -> Self {
        Self {
            messages: Vec::new(),
            format,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Appends a system message.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(Message::system(prompt));
        self
    }

    /// Appends a user message.
    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// A message in the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Completion returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    /// Generated text.
    pub content: String,
    /// Model that produced it.
    pub model: String,
}

impl InferenceResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
        }
    }
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "ollama").
    pub name: String,
    /// Model identifier (e.g., "llama3.2").
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Inference errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// The attempt did not finish within its deadline.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured per-attempt timeout.
        timeout_ms: u64,
    },

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response did not match the expected schema.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The backend answered with a server-side failure.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Credentials rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The backend rejected the request itself.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt failed; the last failure is kept for diagnostics.
    #[error("{operation} unavailable after {attempts} attempt(s): {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },
}

impl InferenceError {
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Returns true if another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::Timeout { .. }
                | InferenceError::Transport(_)
                | InferenceError::MalformedResponse(_)
                | InferenceError::Unavailable(_)
        )
    }
}
