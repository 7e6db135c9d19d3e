use std::future::Future;
use std::time::Duration;

use crate::error::EngineError;

/// Runs `op` up to `attempts` times. A `VenueTransient` error consumes an
/// attempt and backs off exponentially (`base * 2^attempt`) before the next
/// try; any other error (or exhausting all attempts) returns immediately.
/// The final attempt's failure is the observed result — callers decide how
/// to relabel it (`VenuePermanent` for quotes, `SwapRejected` for swaps).
///
/// Returns the value plus the number of retries actually consumed (0 on a
/// first-try success), which the caller records against order/stats state.
pub async fn with_retries<F, Fut, T>(
    attempts: u32,
    backoff_base: Duration,
    mut op: F,
) -> Result<(T, u32), EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut last_err = EngineError::Internal("retry loop ran zero times".into());

    for attempt in 0..attempts.max(1) {
        match op().await {
            Ok(value) => return Ok((value, attempt)),
            Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                last_err = err;
                let backoff = backoff_base * 2u32.pow(attempt);
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn succeeds_immediately_without_consuming_a_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, EngineError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), (42, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(EngineError::VenueTransient { venue: "orca".into(), message: "busy".into() })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), (42, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn a_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(EngineError::VenuePermanent { venue: "orca".into(), message: "halted".into() }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_every_attempt_returns_the_final_transient_error() {
        let calls = AtomicU32::new(0);
        let result = with_retries(2, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(EngineError::VenueTransient { venue: "orca".into(), message: "busy".into() }) }
        })
        .await;

        assert!(matches!(result, Err(EngineError::VenueTransient { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
