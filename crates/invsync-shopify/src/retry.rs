//! Retry with exponential back-off and jitter for Admin API calls.
//!
//! Whether an error is worth retrying depends on the request: a rate-limited
//! request was rejected before it was processed, so it is always safe to
//! resend. A network failure or 5xx on a `POST` may have created a product
//! whose response we never saw, so those are only retried for idempotent
//! requests (`PUT`).

use std::future::Future;
use std::time::Duration;

use crate::error::CatalogError;

const MAX_DELAY_MS: u64 = 60_000;

/// Whether a request can be sent twice without a second side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Idempotency {
    Idempotent,
    NonIdempotent,
}

pub(crate) fn is_retriable(err: &CatalogError, idempotency: Idempotency) -> bool {
    match err {
        CatalogError::RateLimited { .. } => true,
        CatalogError::Http(e) if idempotency == Idempotency::Idempotent => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        CatalogError::UnexpectedStatus { status, .. }
            if idempotency == Idempotency::Idempotent =>
        {
            (500..600).contains(status)
        }
        _ => false,
    }
}

/// Wait before retry `attempt` (1-based): `backoff_base_ms * 2^(attempt-1)`
/// scaled by `jitter`, raised to the server's `Retry-After` on 429, and
/// capped at 60 s.
fn retry_delay(err: &CatalogError, attempt: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (computed.min(MAX_DELAY_MS) as f64 * jitter) as u64;
    let floor = match err {
        CatalogError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    Duration::from_millis(jittered.max(floor).min(MAX_DELAY_MS))
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// retriable errors.
///
/// Back-off carries ± 25 % jitter; see [`retry_delay`]. Non-retriable errors
/// are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    idempotency: Idempotency,
    mut operation: F,
) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err, idempotency) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let jitter = rand::random::<f64>() * 0.5 + 0.75;
                let delay = retry_delay(&err, attempt, backoff_base_ms, jitter);
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Admin API transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
