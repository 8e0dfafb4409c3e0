use std::future::Future;
use std::time::Duration;

use crate::error::TokenkeepError;

/// Bounded retry for transient failures.
///
/// The manager never retries internally; this is the policy an embedding
/// command applies around `refresh()` or its own API calls. Terminal errors
/// (`AuthExpired`, `AuthFlowFailed`, store failures) stop the loop at once.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Fixed-delay policy.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            multiplier: 1.0,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64
            * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(millis as u64)
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, TokenkeepError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TokenkeepError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    tracing::debug!("Attempt {attempt} failed, retrying: {e}");
                    tokio::time::sleep(self.delay_for(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> TokenkeepError {
        TokenkeepError::TokenRefreshFailed {
            status: Some(500),
            detail: "flaky".into(),
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TokenkeepError>(42)
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_error_stops_immediately() {
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let err = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TokenkeepError::AuthExpired)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "auth_expired");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_on_persistent_transient_failure() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let err = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transient())
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "token_refresh_failed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_delay_growth() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn fixed_delay_does_not_grow() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(50));
        assert_eq!(policy.delay_for(1), Duration::from_millis(50));
        assert_eq!(policy.delay_for(2), Duration::from_millis(50));
    }
}
