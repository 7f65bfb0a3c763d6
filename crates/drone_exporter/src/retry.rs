//! Retry utilities for CI API reads.
//!
//! Only rate-limit responses are retried. Every other failure is returned to
//! the caller unchanged so the exporter can apply its failure policy.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay in milliseconds when rate limited.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Maximum retries for a single rate-limited request.
pub const MAX_RETRIES: usize = 5;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Execute an operation, retrying with exponential backoff while
/// `is_rate_limit` says the error is a rate limit.
///
/// `resource` only labels the debug log emitted before each retry.
///
/// # Example
///
/// ```ignore
/// let build = with_retry(
///     || async { client.fetch_build("octocat", "hello-world", 42).await },
///     is_rate_limit_error,
///     short_error_message,
///     RetryConfig::default(),
///     "octocat/hello-world#42",
/// )
/// .await?;
/// ```
pub async fn with_retry<T, E, F, Fut, IsRateLimit, ShortMsg>(
    mut operation: F,
    is_rate_limit: IsRateLimit,
    short_message: ShortMsg,
    config: RetryConfig,
    resource: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
    IsRateLimit: Fn(&E) -> bool + Send + Sync + 'static,
    ShortMsg: Fn(&E) -> String + Send + Sync + 'static,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(config.into_backoff())
        .notify(|err, dur| {
            tracing::debug!(
                resource,
                attempt = attempt.load(Ordering::SeqCst),
                retry_in_ms = dur.as_millis() as u64,
                error = %short_message(err),
                "Rate limited, backing off"
            );
        })
        .when(is_rate_limit)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();

        assert_eq!(config.min_delay, Duration::from_millis(INITIAL_BACKOFF_MS));
        assert_eq!(config.max_delay, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.max_retries, MAX_RETRIES);
        assert!(config.with_jitter);
    }

    #[test]
    fn test_retry_config_custom_without_jitter() {
        let config =
            RetryConfig::new(Duration::from_secs(2), Duration::from_secs(30), 3).with_jitter(false);

        assert_eq!(config.min_delay, Duration::from_secs(2));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert!(!config.with_jitter);
        let _backoff = config.into_backoff();
    }

    #[derive(Debug, Clone)]
    struct TestError {
        message: &'static str,
        rate_limited: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl std::error::Error for TestError {}

    fn fast_config() -> RetryConfig {
        RetryConfig::new(Duration::from_millis(1), Duration::from_millis(5), 5).with_jitter(false)
    }

    #[tokio::test]
    async fn with_retry_retries_rate_limit_errors_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);

        let operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                let n = calls_capture.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError {
                        message: "rate limited",
                        rate_limited: true,
                    })
                } else {
                    Ok(42u32)
                }
            }
        };

        let result = with_retry(
            operation,
            |e: &TestError| e.rate_limited,
            |e: &TestError| e.to_string(),
            fast_config(),
            "octocat/hello-world",
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_does_not_retry_other_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);

        let operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                calls_capture.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError {
                    message: "boom",
                    rate_limited: false,
                })
            }
        };

        let err = with_retry(
            operation,
            |e: &TestError| e.rate_limited,
            |e: &TestError| e.to_string(),
            fast_config(),
            "octocat/hello-world",
        )
        .await
        .expect_err("expected error");

        assert_eq!(err.to_string(), "boom");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_capture = Arc::clone(&calls);

        let operation = move || {
            let calls_capture = Arc::clone(&calls_capture);
            async move {
                calls_capture.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError {
                    message: "slow down",
                    rate_limited: true,
                })
            }
        };

        let config =
            RetryConfig::new(Duration::from_millis(1), Duration::from_millis(2), 2).with_jitter(false);
        let err = with_retry(
            operation,
            |e: &TestError| e.rate_limited,
            |e: &TestError| e.to_string(),
            config,
            "octocat/hello-world",
        )
        .await
        .expect_err("expected error");

        assert_eq!(err.to_string(), "slow down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
