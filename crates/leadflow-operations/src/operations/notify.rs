use std::time::Duration;

use leadflow_config::RetrySettings;
use serde_json::Value;
use tracing::{debug, warn};

use crate::traits::{Notifier, WebhookAck};
use crate::{OperationError, Result};

/// Bounded retry with exponential backoff for webhook calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Attempt counts below one are raised to one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay awaited after failed attempt `attempt` (1-based):
    /// `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            settings.initial_delay,
            settings.max_delay,
        )
    }
}

/// Call `notifier` until it acknowledges or the policy's attempts run out.
///
/// Exactly one call is made per attempt and no delay follows the last one.
///
/// # Errors
///
/// Returns [`OperationError::NotifierExhausted`] with the last failure once
/// every attempt has failed.
pub async fn notify_with_retry<N>(
    notifier: &N,
    payload: &Value,
    policy: &RetryPolicy,
) -> Result<WebhookAck>
where
    N: Notifier + ?Sized,
{
    let mut attempt = 1;
    loop {
        match notifier.notify(payload).await {
            Ok(ack) => {
                debug!(attempt, status = ack.status, "webhook acknowledged");
                return Ok(ack);
            }
            Err(error) if attempt >= policy.max_attempts => {
                warn!(attempt, error = %error, "webhook failed, no attempts left");
                return Err(OperationError::NotifierExhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }
            Err(error) => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "webhook failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
