//! Retry combinator for inference calls.
//!
//! Each attempt runs under its own `tokio::time::timeout`. Between attempts the
//! policy sleeps `base_delay × 2^i`, where `i` is the index of the attempt that
//! just failed. Non-retryable errors stop immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::ports::InferenceError;

/// Attempt budget and timing for one inference operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to 1 if zero.
    pub fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            attempt_timeout,
        }
    }

    /// Sleep after the attempt with the given zero-based index fails.
    pub fn backoff_for(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }

    /// Upper bound on the time one operation can take, fallback included.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = self
            .attempt_timeout
            .saturating_mul(self.max_attempts);
        (0..self.max_attempts.saturating_sub(1))
            .map(|i| self.backoff_for(i))
            .fold(attempts, Duration::saturating_add)
    }

    /// Runs `f` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Exhausted` carrying the last failure.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, InferenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
    {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_attempts {
            if attempts > 0 {
                let delay = self.backoff_for(attempts - 1);
                tracing::debug!(operation, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                sleep(delay).await;
            }
            attempts += 1;

            let outcome = match timeout(self.attempt_timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(InferenceError::timeout(self.attempt_timeout)),
            };

            match outcome {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::info!(operation, attempt = attempts, "Inference succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    tracing::warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        retryable,
                        error = %err,
                        "Inference attempt failed"
                    );
                    last_error = Some(err);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(InferenceError::Exhausted {
            operation: operation.to_string(),
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    /// Like [`RetryPolicy::run`], but substitutes `fallback()` on failure.
    pub async fn run_or_else<T, F, Fut, D>(&self, operation: &str, f: F, fallback: D) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InferenceError>>,
        D: FnOnce() -> T,
    {
        match self.run(operation, f).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(operation, error = %err, "Using fallback value");
                fallback()
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500), Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(50))
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
    }

    #[test]
    fn worst_case_latency_sums_timeouts_and_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500), Duration::from_secs(10));
        // 3 × 10s + 0.5s + 1s
        assert_eq!(policy.worst_case_latency(), Duration::from_millis(31_500));

        let single = RetryPolicy::new(1, Duration::from_millis(500), Duration::from_secs(10));
        assert_eq!(single.worst_case_latency(), Duration::from_secs(10));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy(3);

        let result = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(InferenceError::transport("connection reset"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy(2);

        let result: Result<(), _> = policy
            .run("sentiment analysis", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InferenceError::unavailable("503"))
            })
            .await;

        match result {
            Err(InferenceError::Exhausted {
                operation,
                attempts,
                last_error,
            }) => {
                assert_eq!(operation, "sentiment analysis");
                assert_eq!(attempts, 2);
                assert!(last_error.contains("503"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_early() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy(5);

        let result: Result<(), _> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(InferenceError::AuthenticationFailed)
            })
            .await;

        assert!(matches!(result, Err(InferenceError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out_and_fall_back() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(20));

        let value = policy
            .run_or_else(
                "test",
                || async {
                    sleep(Duration::from_secs(5)).await;
                    Ok("late")
                },
                || "fallback",
            )
            .await;

        assert_eq!(value, "fallback");
    }

    #[tokio::test]
    async fn fallback_not_used_on_success() {
        let value = fast_policy(1)
            .run_or_else("test", || async { Ok(7) }, || 0)
            .await;
        assert_eq!(value, 7);
    }
}
