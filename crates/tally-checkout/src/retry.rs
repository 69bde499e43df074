//! # Retrying Requests
//!
//! The single retry helper shared by every external call.
//!
//! ## Retry Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    retry_request                                        │
//! │                                                                         │
//! │  attempt 1 ──► Ok?  ──────────────────────────────► return Ok          │
//! │     │                                                                   │
//! │     ├── Err, not transient ───────────────────────► return Err          │
//! │     │                                                                   │
//! │     └── Err, transient ──► sleep backoff(1) ──► attempt 2 ──► ...      │
//! │                                                                         │
//! │  After max_attempts the last error is returned; the caller decides     │
//! │  what "giving up" means (for commits: the offline fallback).           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Backoff strategy: maps a 1-based attempt number to a sleep duration.
pub type BackoffFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Retry policy: attempt budget plus a backoff function.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffFn,
}

impl RetryPolicy {
    /// Linearly increasing backoff: `attempt × base`.
    ///
    /// The default commit policy is `linear(3, 1s)`: sleeps of 1s and 2s
    /// between the three attempts.
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(move |attempt| base * attempt),
        }
    }

    /// Single attempt, no sleeps.
    pub fn no_retry() -> Self {
        RetryPolicy {
            max_attempts: 1,
            backoff: Arc::new(|_| Duration::ZERO),
        }
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Runs `op` until it succeeds, fails non-transiently, or exhausts the
/// attempt budget. Only errors for which `is_transient` returns true are
/// retried.
pub async fn retry_request<T, E, Fut, Op>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_transient(&err) => return Err(err),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    warn!(attempts = attempt, error = %err, "Giving up after final attempt");
                    return Err(err);
                }

                let delay = (policy.backoff)(attempt);
                debug!(attempt, ?delay, error = %err, "Transient failure, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn zero_backoff(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Arc::new(|_| Duration::ZERO),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_request(&zero_backoff(3), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_request(&zero_backoff(3), |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("flaky".to_string())
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
    async fn test_exhausts_attempt_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_request(&zero_backoff(3), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("down".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_never_retries_non_transient() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_request(&zero_backoff(5), |_| false, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("rejected".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_linear_backoff_shape() {
        let policy = RetryPolicy::linear(3, Duration::from_millis(1000));
        assert_eq!((policy.backoff)(1), Duration::from_millis(1000));
        assert_eq!((policy.backoff)(2), Duration::from_millis(2000));
        assert_eq!(policy.max_attempts, 3);

        // max_attempts is clamped to at least one attempt
        assert_eq!(RetryPolicy::linear(0, Duration::ZERO).max_attempts, 1);
    }
}
