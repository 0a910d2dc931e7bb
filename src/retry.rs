use std::num::NonZeroU32;
use std::time::Duration;

use log::{error, warn};
use thiserror::Error;

use crate::services::DdnsUpdateError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included. `None` retries
    /// until the operation succeeds or the process is killed.
    pub max_attempts: Option<NonZeroU32>,

    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: NonZeroU32::new(3),
            delay: Duration::from_secs(3),
        }
    }
}

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum RetryError {
    #[error("{what} failed: {source}")]
    Aborted {
        what: &'static str,
        source: DdnsUpdateError,
    },

    #[error("{what} failed after {attempts} attempt(s), last error: {last}")]
    Exhausted {
        what: &'static str,
        attempts: u32,
        last: DdnsUpdateError,
    },
}

/// Runs `op` until it succeeds, sleeping `policy.delay` between attempts.
/// `what` names the operation in log messages.
pub fn retry<T, F>(what: &'static str, policy: &RetryPolicy, op: F) -> Result<T, RetryError>
where
    F: FnMut() -> Result<T, DdnsUpdateError>,
{
    retry_with_sleep(what, policy, op, std::thread::sleep)
}

pub fn retry_with_sleep<T, F, S>(
    what: &'static str,
    policy: &RetryPolicy,
    mut op: F,
    mut sleep: S,
) -> Result<T, RetryError>
where
    F: FnMut() -> Result<T, DdnsUpdateError>,
    S: FnMut(Duration),
{
    let max = policy.max_attempts.map(NonZeroU32::get);
    let mut attempt = 0u32;

    loop {
        attempt = attempt.saturating_add(1);

        let err = match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_terminal() => {
                error!("{} failed: {}", what, e);
                return Err(RetryError::Aborted { what, source: e });
            }
            Err(e) => e,
        };

        match max {
            Some(max) => warn!("Attempt {}/{} to {} failed: {}", attempt, max, what, err),
            None => warn!("Attempt {} to {} failed: {}", attempt, what, err),
        }

        if max.is_some_and(|max| attempt >= max) {
            error!("Giving up on {} after {} attempt(s)", what, attempt);
            return Err(RetryError::Exhausted {
                what,
                attempts: attempt,
                last: err,
            });
        }

        sleep(policy.delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts: NonZeroU32::new(attempts),
            delay: Duration::from_secs(3),
        }
    }

    fn flaky() -> DdnsUpdateError {
        DdnsUpdateError::TransportError("connection refused".into())
    }

    #[test]
    fn succeeds_on_third_attempt() {
        let mut calls = 0;
        let mut sleeps = Vec::new();

        let result = retry_with_sleep(
            "fetch the public IP",
            &policy(3),
            || {
                calls += 1;
                if calls < 3 {
                    Err(flaky())
                } else {
                    Ok("203.0.113.5")
                }
            },
            |d| sleeps.push(d),
        );

        assert_eq!(result, Ok("203.0.113.5"));
        assert_eq!(calls, 3);
        assert_eq!(sleeps, [Duration::from_secs(3); 2]);
    }

    #[test]
    fn first_success_returns_immediately() {
        let mut calls = 0;
        let mut sleeps = 0;

        let result = retry_with_sleep(
            "create the record",
            &policy(3),
            || {
                calls += 1;
                Ok(calls)
            },
            |_| sleeps += 1,
        );

        assert_eq!(result, Ok(1));
        assert_eq!(sleeps, 0);
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let mut calls = 0;
        let mut sleeps = 0;

        let result: Result<(), _> = retry_with_sleep(
            "create the record",
            &policy(3),
            || {
                calls += 1;
                Err(flaky())
            },
            |_| sleeps += 1,
        );

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                what: "create the record",
                attempts: 3,
                last: flaky(),
            })
        );
        assert_eq!(calls, 3);
        assert_eq!(sleeps, 2);
    }

    #[test]
    fn terminal_errors_are_not_retried() {
        let mut calls = 0;
        let rejected = DdnsUpdateError::DomainRejected("example.com".into(), "Invalid domain.".into());

        let result: Result<(), _> = retry_with_sleep(
            "remove stale records",
            &policy(3),
            || {
                calls += 1;
                Err(rejected.clone())
            },
            |_| panic!("must not sleep"),
        );

        assert!(matches!(result, Err(RetryError::Aborted { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn unbounded_keeps_going() {
        let mut calls = 0;

        let result = retry_with_sleep(
            "fetch the public IP",
            &policy(0),
            || {
                calls += 1;
                if calls <= 10 {
                    Err(flaky())
                } else {
                    Ok(())
                }
            },
            |_| (),
        );

        assert_eq!(result, Ok(()));
        assert_eq!(calls, 11);
    }

    #[test]
    fn separate_calls_get_separate_budgets() {
        let policy = policy(2);

        for _ in 0..2 {
            let mut calls = 0;
            let result = retry_with_sleep(
                "fetch the public IP",
                &policy,
                || {
                    calls += 1;
                    if calls < 2 {
                        Err(flaky())
                    } else {
                        Ok(())
                    }
                },
                |_| (),
            );
            assert_eq!(result, Ok(()));
        }
    }
}
