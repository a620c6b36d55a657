//! Fixed-delay retry for transient transport failures.
//!
//! Network errors, timeouts and non-success HTTP statuses are retried after
//! a fixed delay. Anything else (a body that is not JSON, a pagination guard)
//! is returned immediately.

use std::future::Future;
use std::time::Duration;

use pulse_core::AppConfig;

use crate::error::ScraperError;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How often and how patiently a request is repeated.
///
/// `max_attempts = None` retries forever. An endpoint that never recovers
/// then blocks the harvest indefinitely; set a bound to trade that for an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `None` is unbounded.
    pub max_attempts: Option<u32>,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    #[must_use]
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let delay = Duration::from_secs(config.retry_delay_secs);
        match config.retry_max_attempts {
            Some(n) => Self::bounded(n, delay),
            None => Self::unbounded(delay),
        }
    }

    fn allows(&self, attempts_made: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts_made < max)
    }

    /// Run `operation` until it succeeds, fails permanently, or the policy
    /// gives up. `url` only labels the log lines.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, or the last transient error
    /// once `max_attempts` is reached.
    pub async fn run<T, F, Fut>(&self, url: &str, mut operation: F) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && self.allows(attempts) => {
                    tracing::warn!(
                        url,
                        attempt = attempts,
                        delay_secs = self.delay.as_secs_f64(),
                        error = %err,
                        "request failed; retrying after delay"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Network failures, timeouts and non-success statuses are worth repeating.
fn is_transient(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::Http(_) | ScraperError::UnexpectedStatus { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://graph.example.com/page".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = RetryPolicy::unbounded(Duration::ZERO)
            .run("u", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, ScraperError>(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unbounded_policy_keeps_retrying_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = RetryPolicy::unbounded(Duration::ZERO)
            .run("u", || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 9 {
                        Err(server_error())
                    } else {
                        Ok::<u32, ScraperError>(1)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn bounded_policy_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = RetryPolicy::bounded(3, Duration::ZERO)
            .run("u", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, ScraperError>(server_error())
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = RetryPolicy::unbounded(Duration::ZERO)
            .run("u", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    let e = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
                    Err::<u32, ScraperError>(ScraperError::Deserialize {
                        context: "test".to_owned(),
                        source: e,
                    })
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ScraperError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn waits_the_configured_delay_between_attempts() {
        let started = std::time::Instant::now();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let _ = RetryPolicy::bounded(3, Duration::from_millis(40))
            .run("u", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, ScraperError>(server_error())
                }
            })
            .await;
        // two sleeps between three attempts
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn bounded_zero_is_raised_to_one_attempt() {
        assert_eq!(
            RetryPolicy::bounded(0, Duration::ZERO).max_attempts,
            Some(1)
        );
    }
}
