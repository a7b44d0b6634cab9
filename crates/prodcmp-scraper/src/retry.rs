//! Bounded retry with exponential back-off and jitter.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. Whether an error
//! is worth retrying is decided by a caller-supplied predicate, so the same
//! combinator serves page fetches and anything else that talks to the
//! marketplace. Non-retriable errors (block pages, 404s) are returned
//! immediately. [`retry_with_backoff_hinted`] also takes a per-error minimum
//! delay, used to honour a server's `Retry-After`.

use std::future::Future;
use std::time::Duration;

/// Retry limits for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    /// Base delay: the wait before retry `n` is `base * 2^(n-1)` (± 25 % jitter).
    pub backoff_base_ms: u64,
    /// Cap on a single delay.
    pub max_delay_ms: u64,
    /// Cap on the summed delays; once the next delay would exceed it the last
    /// error is returned.
    pub max_total_wait_ms: u64,
}

impl RetryPolicy {
    /// No retries at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
            max_delay_ms: 0,
            max_total_wait_ms: 0,
        }
    }

    /// Un-jittered delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exp = attempt.saturating_sub(1).min(20);
        self.backoff_base_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1_000,
            max_delay_ms: 15_000,
            max_total_wait_ms: 30_000,
        }
    }
}

/// Runs `operation`, retrying while `is_retriable` accepts the error and the
/// policy's attempt and total-wait budgets allow.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Retry | Sleep before it               |
/// |-------|-------------------------------|
/// | 1     | 1 000 ms × 2⁰ ± 25 % jitter   |
/// | 2     | 1 000 ms × 2¹ ± 25 % jitter   |
/// | 3     | 1 000 ms × 2² ± 25 % jitter   |
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retriable: P,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    retry_with_backoff_hinted(policy, is_retriable, |_| None, operation).await
}

/// Like [`retry_with_backoff`], but `min_delay_ms` may name a floor for the
/// wait after a given error. The floor is still capped by `max_delay_ms`, and
/// a wait that would overrun `max_total_wait_ms` ends the retries.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn retry_with_backoff_hinted<T, E, F, Fut, P, H>(
    policy: &RetryPolicy,
    is_retriable: P,
    min_delay_ms: H,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    H: Fn(&E) -> Option<u64>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    let mut waited_ms = 0u64;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;

                let base = policy.backoff_delay_ms(attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered_ms = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                let delay_ms = match min_delay_ms(&err) {
                    Some(floor) => jittered_ms.max(floor.min(policy.max_delay_ms)),
                    None => jittered_ms,
                };

                if waited_ms.saturating_add(delay_ms) > policy.max_total_wait_ms {
                    tracing::warn!(
                        attempt,
                        waited_ms,
                        delay_ms,
                        max_total_wait_ms = policy.max_total_wait_ms,
                        error = %err,
                        "retry wait budget exhausted; giving up"
                    );
                    return Err(err);
                }
                waited_ms += delay_ms;

                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient fetch error; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
