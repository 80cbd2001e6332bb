//! Exponential backoff for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::LlmError;

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(600),
            multiplier: 1.8,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given zero-based failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        self.initial_delay.mul_f64(factor)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// `AuthFailed` is returned immediately. The last transient error is
/// wrapped in `RetriesExhausted`.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut op: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => {
                warn!(provider, error = %e, "Permanent provider failure, not retrying");
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                warn!(
                    provider,
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Provider call failed"
                );
                if attempt >= attempts {
                    return Err(LlmError::RetriesExhausted {
                        provider: provider.to_string(),
                        attempts,
                        last: e.to_string(),
                    });
                }
                tokio::time::sleep(policy.delay_after(attempt - 1)).await;
            }
        }
    }
}
