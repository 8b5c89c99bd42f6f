//! Ollama Provider - Implementation of InferenceProvider for an Ollama host.
//!
//! Uses the non-streaming `POST /api/chat` endpoint. JSON requests set
//! `format: "json"` so the model is constrained to emit a single object.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OllamaConfig::new("http://127.0.0.1:11434")
//!     .with_model("llama3.2")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let provider = OllamaProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, MessageRole,
    OutputFormat, ProviderInfo,
};

/// Configuration for the Ollama provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Host URL without trailing slash (default: http://127.0.0.1:11434).
    pub base_url: String,
    /// Model tag (default: llama3.2).
    pub model: String,
    /// Client-side request timeout.
    pub timeout: Duration,
    /// Temperature for JSON requests unless the request overrides it.
    pub json_temperature: f32,
    /// Temperature for text requests unless the request overrides it.
    pub text_temperature: f32,
    pub num_predict: u32,
    pub num_ctx: u32,
    /// How long the host keeps the model loaded after a request.
    pub keep_alive: String,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(10),
            json_temperature: 0.0,
            text_temperature: 0.7,
            num_predict: 128,
            num_ctx: 2048,
            keep_alive: "5m".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_temperatures(mut self, json: f32, text: f32) -> Self {
        self.json_temperature = json;
        self.text_temperature = text;
        self
    }

    pub fn with_limits(mut self, num_predict: u32, num_ctx: u32) -> Self {
        self.num_predict = num_predict;
        self.num_ctx = num_ctx;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = keep_alive.into();
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:11434")
    }
}

/// Ollama chat API provider.
pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    /// Creates a new provider.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Transport` if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    /// Converts our request to Ollama's chat format.
    fn to_ollama_request(&self, request: &InferenceRequest) -> OllamaChatRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| OllamaMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        let default_temperature = match request.format {
            OutputFormat::Json => self.config.json_temperature,
            OutputFormat::Text => self.config.text_temperature,
        };

        OllamaChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            format: match request.format {
                OutputFormat::Json => Some("json"),
                OutputFormat::Text => None,
            },
            options: OllamaOptions {
                temperature: request.temperature.unwrap_or(default_temperature),
                num_predict: request.max_tokens.unwrap_or(self.config.num_predict),
                num_ctx: self.config.num_ctx,
            },
            keep_alive: self.config.keep_alive.clone(),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::timeout(self.config.timeout)
        } else if e.is_connect() {
            InferenceError::transport(format!("Connection failed: {}", e))
        } else {
            InferenceError::transport(e.to_string())
        }
    }

    async fn handle_response_status(response: Response) -> Result<Response, InferenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, body))
    }
}

/// Maps a non-success HTTP status to an inference error.
fn map_status(status: StatusCode, body: String) -> InferenceError {
    match status.as_u16() {
        401 | 403 => InferenceError::AuthenticationFailed,
        400 | 404 | 422 => InferenceError::InvalidRequest(format!("{}: {}", status, body)),
        500..=599 => InferenceError::unavailable(format!("Server error {}: {}", status, body)),
        _ => InferenceError::transport(format!("Unexpected status {}: {}", status, body)),
    }
}

#[async_trait]
impl InferenceProvider for OllamaProvider {
    async fn complete(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let body = self.to_ollama_request(&request);

        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::handle_response_status(response).await?;

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::malformed(format!("Failed to parse response: {}", e)))?;

        Ok(InferenceResponse::new(chat.message.content, chat.model))
    }

    async fn check_connection(&self, timeout: Duration) -> Result<(), InferenceError> {
        let response = self
            .client
            .get(format!("{}/", self.config.base_url))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::timeout(timeout)
                } else {
                    InferenceError::transport(e.to_string())
                }
            })?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(map_status(response.status(), String::new()))
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("ollama", self.config.model.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Ollama API Types
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
    keep_alive: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    message: OllamaMessage,
}
