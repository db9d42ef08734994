//! Bounded retry with exponential backoff.
//!
//! [`retry_with_backoff`] knows nothing about HTTP. It drives an injected attempt operation,
//! bounding each attempt with a timeout and sleeping between failures, so it can be exercised
//! with deterministic stubs.

use crate::config::RetryPolicy;
use std::future::Future;
use std::time::Duration;

/// Classifies errors that are worth another attempt.
pub trait Retryable {
    /// `false` stops the retry loop immediately with this error.
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Final outcome of a failed retry loop.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The last attempt did not finish within the per-attempt timeout.
    #[error("attempt {attempts} timed out after {}s", .timeout.as_secs())]
    TimedOut { attempts: u32, timeout: Duration },

    /// The last attempt failed with `error`.
    #[error("attempt {attempts} failed: {error}")]
    Failed { attempts: u32, error: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::TimedOut { attempts, .. } | RetryError::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or `policy.max_attempts`
/// attempts have been made.
///
/// `attempt` receives the 1-indexed attempt number. Each attempt completes or times out before
/// the next begins. After attempt *i* fails the loop sleeps `policy.backoff_delay(i)`. A timeout
/// counts as an ordinary failure until the last attempt, where it is reported as
/// [`RetryError::TimedOut`].
///
/// # Errors
///
/// Returns the last attempt's failure once no further attempts will be made.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut current = 1;

    loop {
        let failure = match tokio::time::timeout(policy.attempt_timeout, attempt(current)).await {
            Ok(Ok(value)) => {
                if current > 1 {
                    tracing::info!(attempt = current, "attempt succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Err(error)) if !error.is_retryable() => {
                tracing::warn!(attempt = current, "attempt failed and will not be retried: {error}");
                return Err(RetryError::Failed {
                    attempts: current,
                    error,
                });
            }
            Ok(Err(error)) => RetryError::Failed {
                attempts: current,
                error,
            },
            Err(_) => RetryError::TimedOut {
                attempts: current,
                timeout: policy.attempt_timeout,
            },
        };

        if current >= max_attempts {
            tracing::error!(attempts = current, "giving up: {failure}");
            return Err(failure);
        }

        let delay = policy.backoff_delay(current);
        tracing::warn!(
            attempt = current,
            max_attempts,
            ?delay,
            "{failure}; retrying"
        );
        tokio::time::sleep(delay).await;
        current += 1;
    }
}
