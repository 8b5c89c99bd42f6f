//! Resilient Inference Client - FeedbackAnalyzer on top of any InferenceProvider.
//!
//! Each of the three inference operations goes through the same
//! [`RetryPolicy`], and each has a typed fallback so callers never see an
//! error. Structured responses are validated here: anything that does not
//! match the expected schema counts as `MalformedResponse` and is retried.
//!
//! # Example
//!
//! ```ignore
//! let provider = OllamaProvider::new(OllamaConfig::default())?;
//! let client = ResilientInferenceClient::new(provider, RetryPolicy::default());
//!
//! let sentiment = client.analyze_sentiment("The agent never called back").await;
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::retry::RetryPolicy;
use crate::domain::survey::{SentimentLabel, SentimentResult, SessionSummary};
use crate::ports::{
    FeedbackAnalyzer, InferenceError, InferenceProvider, InferenceRequest, RecoveryContext,
    FALLBACK_RECOVERY_MESSAGE,
};

const SENTIMENT_PROMPT: &str = "Analyze the sentiment of the user's feedback. Return JSON with \
'score' (-1.0 to 1.0), 'label' (Frustrated, Delight, Neutral), and 'keywords' (list).";

const SUMMARY_PROMPT: &str = "Summarize the customer service transcript into a JSON object with \
'topics' (list of strings), 'key_pain_point' (string), and 'metrics' (object).";

const RECOVERY_PROMPT: &str = "The user is frustrated. Generate a short, empathetic recovery \
action or message for a support agent to take. Keep it under 20 words.";

/// Wraps an inference provider with timeouts, retries and typed fallbacks.
pub struct ResilientInferenceClient<P: InferenceProvider> {
    provider: P,
    policy: RetryPolicy,
    probe_timeout: Duration,
}

impl<P: InferenceProvider> ResilientInferenceClient<P> {
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the connectivity probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `request` through the retry policy and parses each response with `parse`.
    async fn complete_with<T, F>(
        &self,
        operation: &str,
        request: InferenceRequest,
        parse: F,
    ) -> Result<T, InferenceError>
    where
        F: Fn(&str) -> Result<T, InferenceError>,
    {
        let provider = &self.provider;
        let request = &request;
        let parse = &parse;
        self.policy
            .run(operation, move || async move {
                let response = provider.complete(request.clone()).await?;
                parse(&response.content)
            })
            .await
    }
}

#[derive(Debug, Deserialize)]
struct RawSentiment {
    score: f64,
    label: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Validates a sentiment JSON object.
fn parse_sentiment(content: &str) -> Result<SentimentResult, InferenceError> {
    let raw: RawSentiment = serde_json::from_str(content.trim())
        .map_err(|e| InferenceError::malformed(format!("sentiment JSON: {}", e)))?;
    let label: SentimentLabel = raw
        .label
        .parse()
        .map_err(|e| InferenceError::malformed(format!("{}", e)))?;
    SentimentResult::new(raw.score as f32, label, raw.keywords)
        .map_err(|e| InferenceError::malformed(format!("{}", e)))
}

/// Validates a summary JSON object.
fn parse_summary(content: &str) -> Result<SessionSummary, InferenceError> {
    serde_json::from_str(content.trim())
        .map_err(|e| InferenceError::malformed(format!("summary JSON: {}", e)))
}

fn parse_recovery(content: &str) -> Result<String, InferenceError> {
    let message = content.trim();
    if message.is_empty() {
        return Err(InferenceError::malformed("empty recovery message"));
    }
    Ok(message.to_string())
}

#[async_trait]
impl<P: InferenceProvider> FeedbackAnalyzer for ResilientInferenceClient<P> {
    async fn analyze_sentiment(&self, text: &str) -> SentimentResult {
        let request = InferenceRequest::json()
            .with_system_prompt(SENTIMENT_PROMPT)
            .with_user_message(text);

        match self
            .complete_with("sentiment analysis", request, parse_sentiment)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "Sentiment unavailable, using neutral fallback");
                SentimentResult::neutral()
            }
        }
    }

    async fn compress_transcript(&self, transcript: &[String]) -> SessionSummary {
        let request = InferenceRequest::json()
            .with_system_prompt(SUMMARY_PROMPT)
            .with_user_message(transcript.join("\n"));

        match self
            .complete_with("transcript compression", request, parse_summary)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(error = %err, "Summary unavailable, using fallback");
                SessionSummary::fallback()
            }
        }
    }

    async fn generate_recovery_message(&self, context: &RecoveryContext) -> String {
        let context_json = match serde_json::to_string(context) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to serialize recovery context");
                return FALLBACK_RECOVERY_MESSAGE.to_string();
            }
        };
        let request = InferenceRequest::text()
            .with_system_prompt(RECOVERY_PROMPT)
            .with_user_message(format!("Context: {}", context_json));

        match self
            .complete_with("recovery message", request, parse_recovery)
            .await
        {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "Recovery message unavailable, using fallback");
                FALLBACK_RECOVERY_MESSAGE.to_string()
            }
        }
    }

    async fn check_connection(&self) -> bool {
        let info = self.provider.provider_info();
        match tokio::time::timeout(
            self.probe_timeout,
            self.provider.check_connection(self.probe_timeout),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::warn!(provider = %info.name, model = %info.model, error = %err, "Inference connectivity check failed");
                false
            }
            Err(_) => {
                tracing::warn!(provider = %info.name, model = %info.model, "Inference connectivity check timed out");
                false
            }
        }
    }
}
