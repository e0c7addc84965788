use thiserror::Error;

/// Failures from the text-generation collaborator.
///
/// Callers inside this crate always recover from these; they surface only as
/// the detail in an "Analysis unavailable" message or a fallback reason.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller-side deadline elapsed before the generator answered.
    #[error("generation timed out after {millis} ms")]
    Timeout { millis: u64 },

    /// The provider asked us to back off (HTTP 429).
    #[error("rate limited by provider")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The provider returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response arrived but did not contain usable text.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No generator credentials are configured.
    #[error("text generator is not configured")]
    NotConfigured,
}
