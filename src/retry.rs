//! Bounded retry with exponential backoff for external collaborator calls.
//!
//! Every outbound call (fetch engine, LLM, speech service, storage, database)
//! runs through [`with_backoff`]. Attempts are bounded and delays are
//! jittered to avoid synchronized retries.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::strategy::{jitter, ExponentialBackoff};
use tokio_retry2::{Retry, RetryError};
use tracing::warn;

/// Retry policy shared by all external calls. Loaded from settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: usize,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Ceiling for the backoff delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_secs: 30,
        }
    }
}

/// Run `operation` with bounded, jittered exponential backoff.
///
/// All errors are treated as transient until attempts run out; the final
/// error is returned unchanged.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let retries = policy.max_attempts.saturating_sub(1);
    let strategy = ExponentialBackoff::from_millis(policy.base_delay_ms)
        .factor(2)
        .max_delay(Duration::from_secs(policy.max_delay_secs))
        .map(jitter)
        .take(retries);

    Retry::spawn(strategy, || async {
        match operation().await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("{} failed, will retry if attempts remain: {}", label, e);
                Err(RetryError::Transient {
                    err: e,
                    retry_after: None,
                })
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);

        let result: Result<u32, String> = with_backoff(&fast_policy(3), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let calls = AtomicUsize::new(0);

        let result: Result<u32, String> = with_backoff(&fast_policy(2), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("always".to_string()) }
        })
        .await;

        assert_eq!(result.unwrap_err(), "always");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
