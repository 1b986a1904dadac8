//! Retry policy for registry calls and cache storage
//!
//! Every outbound call in the bridge retries transient failures with a fixed
//! delay and, in production, never gives up: a tender workflow simply stays
//! suspended at the failing call until the remote side recovers, while other
//! tender tasks keep running.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the error is transient:
//!    a. If attempts remain: log WARN, sleep `delay`, retry
//!    b. If the attempt bound is reached: return the last error
//! 4. If the error is not transient: return it immediately (no retry)

use std::future::Future;
use std::time::Duration;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep between two attempts
    pub delay: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Unbounded retries with a fixed delay
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Unbounded retries with no delay. The sleep still yields to the
    /// scheduler, so sibling tasks keep making progress.
    pub fn immediate() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Stop after `attempts` attempts in total
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_DELAY)
    }
}

/// Run `operation` under `policy`, retrying errors for which `is_transient`
/// returns true.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "get tender 42")
/// * `is_transient` - Classifies an error as retryable
/// * `operation` - Async closure performing one attempt
pub async fn retry_with_policy<F, Fut, T, E, C>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_transient: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient(&err) {
                    return Err(err);
                }

                if policy.exhausted(attempt) {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Giving up: retry attempts exhausted"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, will retry after delay"
                );

                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
