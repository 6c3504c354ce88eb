//! Whole-pipeline retry.
//!
//! The bootstrap+search pipeline is retried as one unit: authentication is
//! idempotent and cheap relative to scrape volume, so every attempt starts
//! from scratch with no state carried over. Fixed delay, no backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::ScrapeError;

/// Runs `op` up to `max_attempts` times with a fixed delay between attempts.
/// Exhaustion wraps the last failure in [`ScrapeError::RetriesExhausted`].
pub async fn with_retries<T, F, Fut>(
    max_attempts: usize,
    delay: Duration,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %err, "attempt failed, retrying");
                sleep(delay).await;
            }
            Err(err) => {
                return Err(ScrapeError::RetriesExhausted {
                    attempts: max_attempts,
                    source: Box::new(err),
                });
            }
        }
    }
}
