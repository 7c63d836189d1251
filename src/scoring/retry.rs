//! Bounded retry with exponential backoff and an injectable sleeper.

use std::time::Duration;

use tracing::warn;

use crate::error::{RbsError, Result};

/// Blocks the caller between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// No backoff between attempts.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.initial_backoff.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_backoff.as_nanos() as f64 {
            return self.max_backoff;
        }
        Duration::from_nanos(nanos.max(0.0).round() as u64)
    }

    /// Run `op` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// `op` receives the 1-based attempt number. Exhaustion yields
    /// `ScoringUnavailable` carrying the last error.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut(u32) -> Result<T>,
    ) -> Result<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "scoring attempt failed");
                    let delay = match &err {
                        RbsError::RateLimited {
                            retry_after: Some(hint),
                        } => (*hint).max(self.backoff_for(attempt)),
                        _ => self.backoff_for(attempt),
                    };
                    last_error = err.to_string();
                    if attempt < max_attempts && !delay.is_zero() {
                        sleeper.sleep(delay);
                    }
                }
            }
        }
        Err(RbsError::ScoringUnavailable {
            attempts: max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_utils::fixtures::RecordingSleeper;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(4), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(500));
    }

    #[test]
    fn succeeds_after_failures_with_exact_attempts() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(10),
            backoff_multiplier: 3.0,
            max_backoff: Duration::from_secs(1),
        };
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let value = policy
            .run(&sleeper, |attempt| {
                calls.set(calls.get() + 1);
                if attempt < 3 {
                    Err(RbsError::Transport("connection reset".to_string()))
                } else {
                    Ok(attempt)
                }
            })
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_millis(10), Duration::from_millis(30)]
        );
    }

    #[test]
    fn exhaustion_reports_attempts_and_last_error() {
        let policy = RetryPolicy::immediate(3);
        let sleeper = RecordingSleeper::default();
        let err = policy
            .run::<()>(&sleeper, |attempt| {
                Err(RbsError::MalformedScore(format!("bad response {attempt}")))
            })
            .unwrap_err();
        match err {
            RbsError::ScoringUnavailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("bad response 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sleeper.sleeps().is_empty());
    }

    #[test]
    fn no_sleep_after_final_attempt() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(1),
        };
        let sleeper = RecordingSleeper::default();
        let _ = policy.run::<()>(&sleeper, |_| Err(RbsError::Timeout(Duration::from_secs(1))));
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(5)]);
    }

    #[test]
    fn rate_limit_hint_extends_delay() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(1),
        };
        let sleeper = RecordingSleeper::default();
        let _ = policy.run::<()>(&sleeper, |_| {
            Err(RbsError::RateLimited {
                retry_after: Some(Duration::from_secs(2)),
            })
        });
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy::immediate(0);
        let sleeper = RecordingSleeper::default();
        assert_eq!(policy.run(&sleeper, |_| Ok(7)).unwrap(), 7);
    }
}
