//! Retry with exponential back-off and jitter for generator requests.
//!
//! Transient provider failures (rate limiting, 5xx, dropped connections) are
//! retried; everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::GenerationError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network timeouts and connect failures, HTTP 5xx, HTTP 429.
///
/// **Not retriable:** 4xx API errors, malformed bodies, the caller-side
/// [`GenerationError::Timeout`], and [`GenerationError::NotConfigured`].
pub(crate) fn is_retriable(err: &GenerationError) -> bool {
    match err {
        GenerationError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        GenerationError::RateLimited { .. } => true,
        GenerationError::Api { status, .. } => *status >= 500,
        GenerationError::Timeout { .. }
        | GenerationError::Malformed(_)
        | GenerationError::NotConfigured => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before retry `n` is `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`, capped at
/// 30 s. A `Retry-After` hint from a 429 raises the delay to at least that
/// many seconds (still capped). When the delay would run past `deadline` the
/// last error is returned instead of sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    deadline: Option<Instant>,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered = (computed as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                let hinted = match &err {
                    GenerationError::RateLimited {
                        retry_after_secs: Some(secs),
                    } => secs.saturating_mul(1_000),
                    _ => 0,
                };
                let delay_ms = jittered.max(hinted).min(MAX_DELAY_MS);
                let delay = Duration::from_millis(delay_ms);
                if deadline.is_some_and(|d| Instant::now() + delay >= d) {
                    tracing::warn!(attempt, delay_ms, error = %err, "generator budget exhausted");
                    return Err(err);
                }
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "generator transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&GenerationError::Api {
            status: 400,
            message: "bad".to_owned()
        }));
        assert!(!is_retriable(&GenerationError::Malformed("x".to_owned())));
        assert!(!is_retriable(&GenerationError::NotConfigured));
        assert!(!is_retriable(&GenerationError::Timeout { millis: 10 }));
    }

    #[test]
    fn server_errors_and_rate_limits_are_retriable() {
        assert!(is_retriable(&GenerationError::Api {
            status: 503,
            message: "overloaded".to_owned()
        }));
        assert!(is_retriable(&GenerationError::RateLimited {
            retry_after_secs: None
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, None, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, GenerationError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, None, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(GenerationError::RateLimited {
                        retry_after_secs: None,
                    })
                } else {
                    Ok::<u32, GenerationError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, None, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GenerationError::Api {
                    status: 502,
                    message: "bad gateway".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(GenerationError::Api { status: 502, .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, None, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GenerationError::Api {
                    status: 401,
                    message: "invalid api key".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(GenerationError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn stops_retrying_once_deadline_has_passed() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let deadline = Instant::now();
        let result = retry_with_backoff(3, 0, Some(deadline), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GenerationError::Api {
                    status: 503,
                    message: "overloaded".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(GenerationError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn skips_back_off_that_would_overrun_deadline() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let started = Instant::now();
        let deadline = started + Duration::from_millis(200);
        let result = retry_with_backoff(3, 0, Some(deadline), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(GenerationError::RateLimited {
                    retry_after_secs: Some(5),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(result, Err(GenerationError::RateLimited { .. })));
    }
}
