//! Bounded retry with exponential backoff.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::outcome::{Outcome, SkipReason};

/// Backoff parameters for one class of operation.
///
/// Delays are stored in milliseconds so the policy can be embedded directly
/// in serialized configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first; the wrapped operation runs at
    /// most `max_retries + 1` times.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    /// Multiply each delay by a uniform factor in `[0.5, 1.0]` so parallel
    /// retry loops don't thunder in lockstep.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits; useful in tests and for operations whose
    /// callers own the pacing.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
            backoff_factor: 1.0,
            jitter: false,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay_ms as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = exponential.min(self.max_delay_ms as f64);
        let millis = if self.jitter && capped > 0.0 {
            capped * rand::thread_rng().gen_range(0.5..=1.0)
        } else {
            capped
        };
        Duration::from_millis(millis as u64)
    }
}

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth retrying after a backoff delay.
    Transient,
    /// The resource is gone; retrying cannot help.
    NotFound,
    /// A validation gate fired; retrying would reject again.
    Rejected,
}

/// Retry executor.
///
/// Attempts run strictly sequentially; a single logical operation is never
/// retried concurrently with itself. Concurrency across *different*
/// operations is the caller's business.
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op`, retrying transient failures up to the policy bound.
    ///
    /// `classify` decides, per error, whether another attempt makes sense.
    /// Non-transient failures short-circuit into the matching skip reason.
    /// Exhausting the bound yields [`SkipReason::Exhausted`]; the error is
    /// logged here, not propagated.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        classify: impl Fn(&E) -> FailureKind,
        mut op: F,
    ) -> Outcome<T>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.policy.max_retries + 1;
        for attempt in 0..attempts {
            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(label, attempt = attempt + 1, "operation recovered");
                    }
                    return Outcome::Ok(value);
                }
                Err(err) => match classify(&err) {
                    FailureKind::NotFound => {
                        debug!(label, error = %err, "resource unavailable, not retrying");
                        return Outcome::Skipped(SkipReason::NotFound);
                    }
                    FailureKind::Rejected => {
                        warn!(label, error = %err, "operation rejected, not retrying");
                        return Outcome::Skipped(SkipReason::Rejected(err.to_string()));
                    }
                    FailureKind::Transient => {
                        let is_last = attempt + 1 == attempts;
                        if is_last {
                            warn!(
                                label,
                                attempts,
                                error = %err,
                                "all retry attempts failed"
                            );
                        } else {
                            let delay = self.policy.delay_for(attempt);
                            debug!(
                                label,
                                attempt = attempt + 1,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "transient failure, backing off"
                            );
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                    }
                },
            }
        }
        Outcome::Skipped(SkipReason::Exhausted { attempts })
    }

    /// Convenience wrapper treating every error as transient.
    pub async fn run_transient<T, E, F, Fut>(&self, label: &str, op: F) -> Outcome<T>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(label, |_| FailureKind::Transient, op).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn invokes_at_most_max_retries_plus_one_times() {
        let retrier = Retrier::new(RetryPolicy::immediate(3));
        let calls = AtomicU32::new(0);

        let outcome: Outcome<u32> = retrier
            .run_transient("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err("boom".to_string()))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Exhausted { attempts: 4 }));
    }

    #[tokio::test]
    async fn returns_first_success_without_further_attempts() {
        let retrier = Retrier::new(RetryPolicy::immediate(5));
        let calls = AtomicU32::new(0);

        let outcome: Outcome<u32> = retrier
            .run_transient("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if n < 2 {
                    Err("flaky".to_string())
                } else {
                    Ok(99)
                })
            })
            .await;

        assert_eq!(outcome, Outcome::Ok(99));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn not_found_short_circuits() {
        let retrier = Retrier::new(RetryPolicy::immediate(5));
        let calls = AtomicU32::new(0);

        let outcome: Outcome<u32> = retrier
            .run(
                "test",
                |_| FailureKind::NotFound,
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Err::<u32, _>("gone".to_string()))
                },
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome, Outcome::Skipped(SkipReason::NotFound));
    }

    #[tokio::test]
    async fn rejected_carries_the_error_message() {
        let retrier = Retrier::new(RetryPolicy::immediate(2));
        let outcome: Outcome<u32> = retrier
            .run(
                "test",
                |_| FailureKind::Rejected,
                || std::future::ready(Err::<u32, _>("file too large".to_string())),
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::Rejected("file too large".to_string()))
        );
    }

    #[test]
    fn delay_is_clamped_to_max() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_ms: 1_000,
            max_delay_ms: 4_000,
            backoff_factor: 2.0,
            jitter: false,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(6), Duration::from_millis(4_000));
    }

    #[test]
    fn jittered_delay_stays_within_half_to_full_range() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
            jitter: true,
        };
        for _ in 0..50 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_millis(1_000), "delay {d:?} below half");
            assert!(d <= Duration::from_millis(2_000), "delay {d:?} above full");
        }
    }
}
