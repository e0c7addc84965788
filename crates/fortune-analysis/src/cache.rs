//! Staleness rules for per-post analysis text.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fortune_core::{Clock, Post};

/// Whether a stored analysis can be reused at `now`.
///
/// False when the result is absent or empty, or the timestamp is absent.
/// Otherwise true iff `timestamp > now - max_age_days`: an analysis exactly
/// `max_age_days` old is already stale.
#[must_use]
pub fn is_valid(
    result: Option<&str>,
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    max_age_days: i64,
) -> bool {
    if result.is_none_or(str::is_empty) {
        return false;
    }
    let Some(timestamp) = timestamp else {
        return false;
    };

    // A window too large to represent reaches back before any timestamp.
    match Duration::try_days(max_age_days).and_then(|age| now.checked_sub_signed(age)) {
        Some(cutoff) => timestamp > cutoff,
        None => true,
    }
}

/// Attach freshly generated `text` to `post`, stamped at `now`.
///
/// Only the analysis fields change.
pub fn record_analysis(post: &mut Post, text: impl Into<String>, now: DateTime<Utc>) {
    post.analysis_result = Some(text.into());
    post.analysis_date = Some(now);
    post.analysis_cached = true;
}

/// [`is_valid`] and [`record_analysis`] bound to a staleness window and clock.
#[derive(Clone)]
pub struct AnalysisCache {
    max_age_days: i64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("max_age_days", &self.max_age_days)
            .finish_non_exhaustive()
    }
}

impl AnalysisCache {
    #[must_use]
    pub fn new(max_age_days: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_age_days,
            clock,
        }
    }

    #[must_use]
    pub fn max_age_days(&self) -> i64 {
        self.max_age_days
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The cached analysis text of `post`, if it is still fresh.
    #[must_use]
    pub fn fresh_result<'a>(&self, post: &'a Post) -> Option<&'a str> {
        let result = post.analysis_result.as_deref();
        is_valid(result, post.analysis_date, self.now(), self.max_age_days)
            .then_some(result)
            .flatten()
    }

    #[must_use]
    pub fn is_fresh(&self, post: &Post) -> bool {
        self.fresh_result(post).is_some()
    }

    pub fn record(&self, post: &mut Post, text: impl Into<String>) {
        record_analysis(post, text, self.now());
    }
}
