//! Retry and request-pacing utilities shared by every provider adapter.
//!
//! Transient failures (429, network errors, 5xx) are retried with exponential
//! backoff. Anything else is propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: connection reset, timeout, DNS failure.
/// - [`ScraperError::HttpStatus`] with a 5xx status.
///
/// Bot-protection blocks, 4xx statuses, parse failures and API status errors
/// are not retried; the same request would fail the same way.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::HttpStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// Sleeps `backoff_base_secs * 2^attempt` seconds between attempts, up to
/// `max_retries` additional attempts after the first try. With
/// `max_retries = 2` the operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient source error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

/// Sleep before a follow-up request to the same upstream.
///
/// The pause is `base_ms` with ±25 % jitter so consecutive scrapes do not
/// hit a directory on a fixed beat. A zero base disables pacing.
pub(crate) async fn pace(base_ms: u64) {
    if base_ms == 0 {
        return;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (base_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}
