use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the first retry; doubles on every further retry.
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2000,
        }
    }
}

/// Sleep between sequential provider calls. Throttling only.
pub async fn delay(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Run `op` until it succeeds, fails with something other than a rate limit,
/// or `policy.max_attempts` is used up. Only rate limits are retried.
pub async fn fetch_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff_ms = policy.initial_backoff_ms;
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && attempt < max_attempts => {
                warn!(attempt, max_attempts, backoff_ms, error = %err, "rate limited; backing off");
                delay(backoff_ms).await;
                backoff_ms = backoff_ms.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
