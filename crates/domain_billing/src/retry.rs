//! Bounded retry for conflict and unavailability errors

use std::future::Future;

use tracing::warn;

use core_kernel::RetryPolicy;

use crate::error::BillingError;

/// Runs `operation`, retrying while it fails with a retryable error
///
/// Each attempt re-runs the whole closure, so a retried write re-reads the
/// documents it depends on. Waits `base_delay × 2^attempt` between attempts
/// and gives up after `policy.max_attempts`, returning the last error.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, BillingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BillingError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after retryable error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = with_retry(&policy, "flaky", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(BillingError::ConcurrencyConflict("lost race".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: Result<(), _> = with_retry(&policy, "down", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::Unavailable("store down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(BillingError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_business_errors_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&RetryPolicy::default(), "invalid", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::validation("amount must be positive"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
