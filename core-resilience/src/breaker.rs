//! Circuit breaker around a flaky external dependency.
//!
//! Classic three-state machine: `CLOSED` counts matching failures, trips to
//! `OPEN` at the threshold, rejects calls until the recovery timeout has
//! elapsed, then lets exactly one probe through (`HALF_OPEN`). The probe's
//! result decides between closing again and re-opening with a fresh timer.
//!
//! The breaker is intentionally unsynchronized: `call` takes `&mut self`, so
//! one breaker instance belongs to one logical caller chain. Callers that
//! genuinely need sharing must wrap it in a lock of their choosing — the
//! type system makes accidental unsynchronized sharing unrepresentable.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Breaker tuning knobs, embeddable in serialized configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerPolicy {
    /// Consecutive matching failures that trip the breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before allowing a probe call.
    pub recovery_timeout_secs: u64,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 60,
        }
    }
}

impl BreakerPolicy {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Error, Debug)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without invoking the operation.
    #[error("circuit breaker is open")]
    Open,
    /// The wrapped operation failed; the original error is preserved.
    #[error(transparent)]
    Inner(E),
}

/// Failure-counting gate; see the module docs for the state machine.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    recovery_timeout: Duration,
    state: BreakerState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(policy: &BreakerPolicy) -> Self {
        Self {
            threshold: policy.failure_threshold.max(1),
            recovery_timeout: policy.recovery_timeout(),
            state: BreakerState::Closed,
            failure_count: 0,
            last_failure_at: None,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Run `op` through the breaker.
    ///
    /// `counts` decides which errors feed the failure counter; non-matching
    /// errors pass through untouched, leaving the breaker state as-is.
    ///
    /// # Errors
    ///
    /// [`BreakerError::Open`] when the call is rejected eagerly,
    /// [`BreakerError::Inner`] when the wrapped operation fails.
    pub async fn call<T, E, Fut>(
        &mut self,
        counts: impl Fn(&E) -> bool,
        op: impl FnOnce() -> Fut,
    ) -> Result<T, BreakerError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        if self.state == BreakerState::Open {
            let elapsed = self
                .last_failure_at
                .map(|at| at.elapsed())
                .unwrap_or(Duration::MAX);
            if elapsed < self.recovery_timeout {
                debug!("breaker open, rejecting call eagerly");
                return Err(BreakerError::Open);
            }
            debug!("recovery timeout elapsed, probing half-open");
            self.state = BreakerState::HalfOpen;
        }

        match op().await {
            Ok(value) => {
                if self.state == BreakerState::HalfOpen {
                    debug!("half-open probe succeeded, closing breaker");
                }
                self.state = BreakerState::Closed;
                self.failure_count = 0;
                Ok(value)
            }
            Err(err) => {
                if counts(&err) {
                    self.record_failure();
                }
                Err(BreakerError::Inner(err))
            }
        }
    }

    fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_at = Some(Instant::now());
        match self.state {
            BreakerState::HalfOpen => {
                warn!("half-open probe failed, re-opening breaker");
                self.state = BreakerState::Open;
            }
            BreakerState::Closed if self.failure_count >= self.threshold => {
                warn!(
                    failures = self.failure_count,
                    "failure threshold reached, opening breaker"
                );
                self.state = BreakerState::Open;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker_with(threshold: u32, recovery: Duration) -> CircuitBreaker {
        let mut b = CircuitBreaker::new(&BreakerPolicy {
            failure_threshold: threshold,
            recovery_timeout_secs: 0,
        });
        b.recovery_timeout = recovery;
        b
    }

    async fn fail(b: &mut CircuitBreaker) -> Result<(), BreakerError<String>> {
        b.call(|_| true, || std::future::ready(Err::<(), _>("boom".to_string())))
            .await
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let mut b = breaker_with(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(matches!(fail(&mut b).await, Err(BreakerError::Inner(_))));
        }
        assert_eq!(b.state(), BreakerState::Open);

        // Next call is rejected without invoking the operation.
        let invoked = AtomicU32::new(0);
        let result: Result<(), _> = b
            .call(
                |_: &String| true,
                || {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Ok(()))
                },
            )
            .await;
        assert!(matches!(result, Err(BreakerError::Open)));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn half_open_success_closes_and_resets() {
        let mut b = breaker_with(2, Duration::from_millis(10));

        for _ in 0..2 {
            let _ = fail(&mut b).await;
        }
        assert_eq!(b.state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(25)).await;

        let result: Result<u32, BreakerError<String>> =
            b.call(|_| true, || std::future::ready(Ok(42))).await;
        assert!(matches!(result, Ok(42)));
        assert_eq!(b.state(), BreakerState::Closed);
        assert_eq!(b.failure_count(), 0);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let mut b = breaker_with(2, Duration::from_millis(10));

        for _ in 0..2 {
            let _ = fail(&mut b).await;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;

        // Probe fails: straight back to open.
        assert!(matches!(fail(&mut b).await, Err(BreakerError::Inner(_))));
        assert_eq!(b.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn non_matching_errors_do_not_count() {
        let mut b = breaker_with(1, Duration::from_secs(60));

        let result: Result<(), BreakerError<String>> = b
            .call(
                |_| false,
                || std::future::ready(Err("unrelated".to_string())),
            )
            .await;
        assert!(matches!(result, Err(BreakerError::Inner(_))));
        assert_eq!(b.state(), BreakerState::Closed);
        assert_eq!(b.failure_count(), 0);
    }
}
