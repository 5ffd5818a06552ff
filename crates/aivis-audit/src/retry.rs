//! Retry with exponential backoff for transient catalog errors.
//!
//! Transient conditions (429, network failures) are retried with
//! exponential backoff plus a small random jitter so concurrent audit
//! runs don't re-hit a struggling catalog host in lockstep. Permanent
//! failures (404, parse errors, unexpected 4xx) propagate immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::CatalogError;

/// Returns `true` if `err` is a transient condition worth retrying.
fn is_transient(err: &CatalogError) -> bool {
    matches!(
        err,
        CatalogError::RateLimited { .. } | CatalogError::Http(_)
    )
}

/// Executes `operation`, retrying transient errors up to `max_retries`
/// additional attempts after the first.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds
/// plus up to 10% jitter. Non-transient errors are returned without
/// sleeping. With `max_retries = 3` the operation runs at most 4 times.
pub(crate) async fn with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_transient(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        // base * 2^attempt seconds, saturating so extreme configs can't overflow.
        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        // Up to 10% jitter (delay_secs * 100ms); zero when the base delay is zero.
        let jitter_ms = rand::rng().random_range(0..=delay_secs.saturating_mul(100));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient catalog error — retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs) + Duration::from_millis(jitter_ms))
            .await;
        attempt += 1;
    }
}
