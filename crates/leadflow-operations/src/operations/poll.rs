use std::future::Future;
use std::time::Duration;

use leadflow_config::PollSettings;
use tracing::debug;

use crate::{OperationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Attempt counts below one are raised to one.
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.max_attempts, settings.interval)
    }
}

/// Run `check` until it yields a value, at most `max_attempts` times.
///
/// Attempts are `interval` apart; there is no wait before the first attempt
/// or after the last.
///
/// # Errors
///
/// An error from `check` is returned immediately. Returns
/// [`OperationError::PollTimeout`] when every attempt came back empty.
pub async fn poll_until<T, F, Fut>(mut check: F, policy: &PollPolicy) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = check().await? {
            debug!(attempt, "poll found value");
            return Ok(value);
        }
        debug!(attempt, max_attempts = policy.max_attempts, "poll found nothing");
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(OperationError::PollTimeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn empty_check_runs_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<String> = poll_until(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            },
            &PollPolicy::new(4, Duration::from_secs(10)),
        )
        .await;

        assert!(matches!(result, Err(OperationError::PollTimeout { attempts: 4 })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_value_without_waiting() -> anyhow::Result<()> {
        let start = Instant::now();

        let value = poll_until(
            || async { Ok(Some("CONTACT-1")) },
            &PollPolicy::new(10, Duration::from_secs(10)),
        )
        .await?;

        assert_eq!(value, "CONTACT-1");
        assert_eq!(start.elapsed(), Duration::ZERO);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn value_on_later_attempt_stops_polling() -> anyhow::Result<()> {
        let calls = AtomicU32::new(0);

        let value = poll_until(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok((n == 3).then_some(n)) }
            },
            &PollPolicy::new(10, Duration::from_secs(1)),
        )
        .await?;

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn check_error_is_terminal() {
        let calls = AtomicU32::new(0);

        let result: Result<String> = poll_until(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OperationError::UserNotFound("recGone".into())) }
            },
            &PollPolicy::new(5, Duration::from_secs(1)),
        )
        .await;

        assert!(matches!(result, Err(OperationError::UserNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let policy = PollPolicy::from(PollSettings {
            max_attempts: 0,
            interval: Duration::from_secs(1),
        });

        assert_eq!(policy.max_attempts(), 1);
    }
}
