//! Inference Adapters.
//!
//! ## Available Adapters
//!
//! - `OllamaProvider` - Ollama chat API over HTTP
//! - `MockInferenceProvider` - Configurable mock for testing
//! - `ResilientInferenceClient` - `FeedbackAnalyzer` with timeouts, retries and fallbacks
//! - `RetryPolicy` - The retry/backoff combinator it is built on

mod mock_provider;
mod ollama_provider;
mod resilient_client;
mod retry;

pub use mock_provider::MockInferenceProvider;
pub use ollama_provider::{OllamaConfig, OllamaProvider};
pub use resilient_client::ResilientInferenceClient;
pub use retry::RetryPolicy;
