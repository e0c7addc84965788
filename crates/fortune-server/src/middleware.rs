use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fortune_core::AppConfig;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request budget for the `/api` routes.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<Window>>,
}

/// Outcome of counting one request against the window.
#[derive(Debug, PartialEq, Eq)]
enum Admission {
    Allowed,
    /// Rejected; the window resets in this many whole seconds.
    Limited { retry_after_secs: u64 },
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new(Window {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Limiter configured by `FORTUNE_RATE_LIMIT_*`; `None` when the request
    /// budget is 0.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        (config.rate_limit_max_requests > 0).then(|| {
            Self::new(
                config.rate_limit_max_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            )
        })
    }

    async fn admit(&self) -> Admission {
        let mut window = self.current.lock().await;
        let elapsed = window.started_at.elapsed();
        if elapsed >= self.window {
            window.started_at = Instant::now();
            window.count = 0;
        } else if window.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_secs = remaining
                .as_secs()
                .saturating_add(u64::from(remaining.subsec_nanos() > 0))
                .max(1);
            return Admission::Limited { retry_after_secs };
        }
        window.count += 1;
        Admission::Allowed
    }
}

/// Reuses an incoming `x-request-id` or generates a `UUIDv4`, stores it as a
/// [`RequestId`] extension and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Rejects requests over the window budget with a `rate_limited` API error
/// and a `Retry-After` header.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match rate_limit.admit().await {
        Admission::Allowed => next.run(req).await,
        Admission::Limited { retry_after_secs } => {
            let request_id = req
                .extensions()
                .get::<RequestId>()
                .map(|r| r.0.clone())
                .unwrap_or_default();
            tracing::warn!(
                path = %req.uri().path(),
                max_requests = rate_limit.max_requests,
                retry_after_secs,
                "rate limit exceeded"
            );
            let mut res = ApiError::new(
                request_id,
                "rate_limited",
                format!("Too many requests. Try again in {retry_after_secs}s."),
            )
            .into_response();
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            res
        }
    }
}
