//! Bounded retry for an unreachable document store

use std::future::Future;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::StoreRetryConfig;
use crate::error::{EngineError, EngineResult};

/// Run `attempt` until it succeeds, fails with anything other than
/// `StoreUnavailable`, or the policy runs out of attempts.
pub(crate) fn with_store_retry<T>(
    policy: &StoreRetryConfig,
    operation: &'static str,
    mut attempt: impl FnMut() -> EngineResult<T>,
) -> EngineResult<T> {
    let mut attempt_no = 1;
    loop {
        match attempt() {
            Err(EngineError::StoreUnavailable(reason)) if attempt_no < policy.max_attempts => {
                attempt_no += 1;
                thread::sleep(retry_backoff(policy, operation, attempt_no, &reason));
            }
            outcome => return outcome,
        }
    }
}

/// Async form of [`with_store_retry`] for callers on a runtime worker.
///
/// Backoff sleeps on the runtime timer and ends early with `cancelled()`
/// when `cancel` fires.
pub(crate) async fn with_store_retry_async<T, F, Fut>(
    policy: &StoreRetryConfig,
    operation: &'static str,
    cancel: &CancellationToken,
    cancelled: impl Fn() -> EngineError,
    mut attempt: F,
) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let mut attempt_no = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        match attempt().await {
            Err(EngineError::StoreUnavailable(reason)) if attempt_no < policy.max_attempts => {
                attempt_no += 1;
                let backoff = retry_backoff(policy, operation, attempt_no, &reason);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled()),
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
            outcome => return outcome,
        }
    }
}

fn retry_backoff(
    policy: &StoreRetryConfig,
    operation: &'static str,
    attempt_no: u32,
    reason: &str,
) -> Duration {
    let backoff = policy.backoff_before(attempt_no);
    warn!(
        event = "STORE_UNAVAILABLE_RETRY",
        operation,
        attempt = attempt_no,
        backoff_ms = backoff.as_millis() as u64,
        reason = %reason,
    );
    backoff
}
