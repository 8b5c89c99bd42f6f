//! Mock Inference Provider for testing.
//!
//! Provides a configurable mock implementation of the InferenceProvider port,
//! allowing tests to run without an inference host.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Per-response and global simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockInferenceProvider::new()
//!     .with_error(InferenceError::transport("reset"))
//!     .with_response(r#"{"score": -0.8, "label": "Frustrated", "keywords": []}"#);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, ProviderInfo};

/// A configured mock reply.
#[derive(Debug, Clone)]
struct MockReply {
    delay: Duration,
    outcome: Result<String, InferenceError>,
}

/// Mock inference provider for testing.
///
/// Clones share the queue and call history, so a test can hand one clone to
/// the code under test and inspect the other.
#[derive(Debug, Clone)]
pub struct MockInferenceProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    default_response: String,
    delay: Duration,
    connection: Result<(), InferenceError>,
    info: ProviderInfo,
    calls: Arc<Mutex<Vec<InferenceRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockInferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            default_response: "Mock response".to_string(),
            delay: Duration::ZERO,
            connection: Ok(()),
            info: ProviderInfo::new("mock", "mock-model"),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful completion.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Duration::ZERO, Ok(content.into()))
    }

    /// Queues a successful completion that arrives after `delay`.
    pub fn with_delayed_response(self, content: impl Into<String>, delay: Duration) -> Self {
        self.push(delay, Ok(content.into()))
    }

    /// Queues an error.
    pub fn with_error(self, error: InferenceError) -> Self {
        self.push(Duration::ZERO, Err(error))
    }

    /// Content returned once the queue is empty.
    pub fn with_default_response(mut self, content: impl Into<String>) -> Self {
        self.default_response = content.into();
        self
    }

    /// Latency added to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes `check_connection` fail with the given error.
    pub fn with_connection_error(mut self, error: InferenceError) -> Self {
        self.connection = Err(error);
        self
    }

    fn push(self, delay: Duration, outcome: Result<String, InferenceError>) -> Self {
        lock(&self.replies).push_back(MockReply { delay, outcome });
        self
    }

    /// Returns the number of completions requested so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded requests.
    pub fn get_calls(&self) -> Vec<InferenceRequest> {
        lock(&self.calls).clone()
    }

    fn next_reply(&self) -> MockReply {
        lock(&self.replies).pop_front().unwrap_or_else(|| MockReply {
            delay: Duration::ZERO,
            outcome: Ok(self.default_response.clone()),
        })
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn complete(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        lock(&self.calls).push(request);

        let reply = self.next_reply();
        let delay = self.delay + reply.delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }

        reply
            .outcome
            .map(|content| InferenceResponse::new(content, self.info.model.clone()))
    }

    async fn check_connection(&self, _timeout: Duration) -> Result<(), InferenceError> {
        self.connection.clone()
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
