//! Bounded retry/poll primitive for state convergence checks.
//!
//! Every "wait for the disk to detach" / "wait for the service to stop" step
//! in the engine is a [`RetryPoller::poll`] over a single adapter query.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{FaultlineError, Result};

/// Bounded-retry poller: evaluates a check up to a fixed number of attempts,
/// sleeping a fixed interval between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPoller {
    attempts: u32,
    interval: Duration,
}

impl RetryPoller {
    /// Create a poller with an explicit attempt count and interval.
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Derive the attempt budget from a timeout and a delay, truncating.
    ///
    /// The division is done in milliseconds so sub-second budgets keep their
    /// granularity. A timeout smaller than the delay yields zero attempts;
    /// `poll` still performs one check in that case rather than silently
    /// succeeding.
    pub fn from_budget(timeout: Duration, delay: Duration) -> Self {
        let attempts = if delay.is_zero() {
            1
        } else {
            (timeout.as_millis() / delay.as_millis().max(1)) as u32
        };
        Self {
            attempts,
            interval: delay,
        }
    }

    /// Number of checks this poller will perform.
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Interval between checks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Repeatedly evaluate `check` until it succeeds or the budget runs out.
    ///
    /// Returns on the first success with no trailing sleep. On exhaustion the
    /// last observed error is returned. A check error is retryable by
    /// construction here; fatal classification happens in the caller.
    pub async fn poll<F, Fut>(&self, mut check: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let attempts = self.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            match check().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!(attempt, attempts, error = %e, "poll attempt failed");
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                sleep(self.interval).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| FaultlineError::Internal("poll exhausted without error".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn poll_returns_on_first_success() {
        let poller = RetryPoller::new(5, Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = poller
            .poll(|| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn poll_performs_at_most_n_checks_and_returns_last_error() {
        let poller = RetryPoller::new(3, Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = poller
            .poll(|| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    let n = calls.fetch_add(1, Ordering::Relaxed) + 1;
                    Err(FaultlineError::Convergence {
                        target: "disk-1".into(),
                        expected: "detached".into(),
                        reason: format!("attempt {}", n),
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::Relaxed), 3);
        match result {
            Err(FaultlineError::Convergence { reason, .. }) => assert_eq!(reason, "attempt 3"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_checks_once() {
        // timeout < delay truncates to zero attempts
        let poller = RetryPoller::from_budget(Duration::from_secs(1), Duration::from_secs(2));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = poller
            .poll(|| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::Relaxed);
                    Err(FaultlineError::Internal("not yet".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn eventual_success_within_budget() {
        let poller = RetryPoller::new(4, Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = poller
            .poll(|| {
                let calls = Arc::clone(&calls_clone);
                async move {
                    if calls.fetch_add(1, Ordering::Relaxed) < 2 {
                        Err(FaultlineError::Internal("not yet".into()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn budget_truncates() {
        let poller = RetryPoller::from_budget(Duration::from_secs(180), Duration::from_secs(2));
        assert_eq!(poller.attempts(), 90);

        let poller = RetryPoller::from_budget(Duration::from_secs(7), Duration::from_secs(2));
        assert_eq!(poller.attempts(), 3);
    }

    #[test]
    fn budget_keeps_sub_second_granularity() {
        let poller =
            RetryPoller::from_budget(Duration::from_millis(20), Duration::from_millis(2));
        assert_eq!(poller.attempts(), 10);

        let poller =
            RetryPoller::from_budget(Duration::from_millis(500), Duration::from_millis(150));
        assert_eq!(poller.attempts(), 3);
    }
}
