//! Bounded restart of whole operations after a concurrency conflict

use std::thread;
use std::time::Duration;

use crate::domain::result::Result;

/// Default number of restarts after a concurrency conflict
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Upper bound accepted for a configured retry count
pub const MAX_CONFLICT_RETRIES_LIMIT: u32 = 20;

/// Initial backoff in milliseconds (doubles each retry: 5, 10, 20ms)
const INITIAL_BACKOFF_MS: u64 = 5;

/// Longest single backoff in milliseconds
const MAX_BACKOFF_MS: u64 = 500;

/// Delay before restart number `retry + 1`
fn backoff(retry: u32) -> Duration {
    let factor = 1u64 << retry.min(16);
    Duration::from_millis(INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// has been restarted `max_retries` times.
///
/// Each call to `attempt` must open its own scope, so a restart always
/// begins again from fresh reads.
pub(crate) fn retry_on_conflict<T>(
    operation: &'static str,
    max_retries: u32,
    mut attempt: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut retries = 0;
    loop {
        match attempt() {
            Err(e) if e.is_retryable() && retries < max_retries => {
                let delay = backoff(retries);
                retries += 1;
                tracing::warn!(
                    operation,
                    retry = retries,
                    max_retries,
                    error = %e,
                    "concurrency conflict, restarting"
                );
                thread::sleep(delay);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;

    #[test]
    fn test_retries_until_success() {
        let mut calls = 0;
        let result = retry_on_conflict("test", 3, || {
            calls += 1;
            if calls < 3 {
                Err(Error::ConcurrencyConflict("busy".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let mut calls = 0;
        let result: Result<()> = retry_on_conflict("test", 2, || {
            calls += 1;
            Err(Error::ConcurrencyConflict("busy".into()))
        });
        assert!(matches!(result, Err(Error::ConcurrencyConflict(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff(0), Duration::from_millis(5));
        assert_eq!(backoff(2), Duration::from_millis(20));
        assert_eq!(backoff(7), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff(63), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff(u32::MAX), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<()> = retry_on_conflict("test", 5, || {
            calls += 1;
            Err(Error::persistence("disk full"))
        });
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert_eq!(calls, 1);
    }
}
