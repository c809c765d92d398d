use crate::error::CoreError;
use crate::error_utils::ErrorExt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Backoff policy shared by every network call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Upper bound of the random extra delay, as a fraction of the backoff.
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    /// Retries immediately. Used by tests.
    pub fn without_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay before retry number `retry` (zero based), capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * self.multiplier.powi(retry as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());
        let jittered = capped * (1.0 + self.jitter * fastrand::f64());
        Duration::from_secs_f64(jittered).min(self.max_delay)
    }

    /// The wait after `error`, or `None` when it should not be retried.
    /// A server-requested delay replaces the computed backoff.
    pub fn delay_for(&self, error: &CoreError, retry: u32) -> Option<Duration> {
        if !error.is_retryable() {
            return None;
        }
        let delay = match error.retry_after() {
            Some(requested) => requested.min(self.max_delay),
            None => self.backoff(retry),
        };
        Some(delay)
    }
}

/// Runs a fallible async operation under a [`RetryConfig`].
///
/// Permanent errors come back after the first attempt. When attempts run out
/// the last transient error is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let Some(delay) = self.config.delay_for(&error, attempt - 1) else {
                debug!("{} failed permanently: {}", operation_name, error);
                return Err(error);
            };
            if attempt >= max_attempts {
                warn!(
                    "{} failed after {} attempts: {}",
                    operation_name, max_attempts, error
                );
                return Err(error);
            }

            info!(
                "{} failed (attempt {}/{}), retrying in {:?}: {}",
                operation_name, attempt, max_attempts, delay, error
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, LlmError, RedditApiError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn no_jitter() -> RetryConfig {
        RetryConfig {
            jitter: 0.0,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn test_backoff_doubles_from_four_seconds_up_to_a_minute() {
        let config = no_jitter();
        let delays: Vec<u64> = (0..6).map(|n| config.backoff(n).as_secs()).collect();
        assert_eq!(delays, vec![4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn test_jitter_only_adds_delay() {
        let config = RetryConfig::default();
        for _ in 0..20 {
            let delay = config.backoff(1);
            assert!(delay >= Duration::from_secs(8));
            assert!(delay <= Duration::from_secs_f64(8.8));
        }
    }

    #[test]
    fn test_requested_delay_wins_but_is_capped() {
        let config = no_jitter();

        let reddit = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 20 });
        assert_eq!(config.delay_for(&reddit, 3), Some(Duration::from_secs(20)));

        let llm = CoreError::Llm(LlmError::RateLimitExceeded {
            provider: "openai".to_string(),
            retry_after: 600,
        });
        assert_eq!(config.delay_for(&llm, 0), Some(Duration::from_secs(60)));

        let auth = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
            reason: "bad secret".to_string(),
        });
        assert_eq!(config.delay_for(&auth, 0), None);

        let busy = CoreError::Llm(LlmError::ServiceUnavailable {
            provider: "openai".to_string(),
        });
        assert_eq!(config.delay_for(&busy, 1), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_success_on_first_attempt() {
        let executor = RetryExecutor::new(RetryConfig::without_delay(3));
        let result = tokio_test::block_on(
            executor.execute("noop", || async { Ok::<i32, CoreError>(42) }),
        );
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let executor = RetryExecutor::new(RetryConfig::without_delay(3));
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = executor
            .execute("fetch r/OpenAI", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(CoreError::RedditApi(RedditApiError::ServerError {
                            status_code: 503,
                        }))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let executor = RetryExecutor::new(RetryConfig::without_delay(5));
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = executor
            .execute("summarize", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, CoreError>(CoreError::Config(
                        ConfigError::MissingEnvironmentVariable {
                            var_name: "OPENAI_API_KEY".to_string(),
                        },
                    ))
                }
            })
            .await;

        assert!(matches!(result, Err(CoreError::Config(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_returned_after_exhausting_attempts() {
        let executor = RetryExecutor::new(RetryConfig::without_delay(4));
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let result = executor
            .execute("fetch r/grok", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), CoreError>(CoreError::RedditApi(RedditApiError::RequestTimeout))
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::RequestTimeout))
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }
}
