//! Exponential backoff bounded by an absolute deadline.

use crate::acl::AclError;
use crate::config::RetryConfig;
use crate::errors::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backoff factor applied after every failed attempt
const BACKOFF_FACTOR: u32 = 2;

/// Runs `call` until it succeeds or `config.expiration` has elapsed since the first attempt.
///
/// - Each attempt is cut off at the deadline, so a hanging call cannot hold the loop past it.
/// - Backoff starts at `initial_backoff`, doubles after every failure and is capped at
///   `max_backoff`.
/// - A retry whose backoff would end at or after the deadline is not started; the last error is
///   returned as [`Error::UpstreamUnavailable`].
pub async fn retry_until_deadline<T, F, Fut>(config: &RetryConfig, operation: &str, mut call: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AclError>>,
{
    let deadline = Instant::now() + config.expiration;
    let mut backoff = config.initial_backoff;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let outcome = match tokio::time::timeout_at(deadline, call()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AclError::DeadlineExceeded),
        };

        let error = match outcome {
            Ok(value) => {
                if attempts > 1 {
                    debug!(operation, attempts, "Access control call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let retry_at = Instant::now() + backoff;
        if retry_at >= deadline {
            warn!(operation, attempts, error = %error, "Giving up on access control call, retry deadline reached");
            return Err(Error::UpstreamUnavailable { attempts, source: error });
        }

        debug!(
            operation,
            attempts,
            backoff_ms = backoff.as_millis() as u64,
            error = %error,
            "Access control call failed, retrying"
        );
        tokio::time::sleep_until(retry_at).await;
        backoff = next_backoff(backoff, config.max_backoff);
    }
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(BACKOFF_FACTOR).min(max)
}
