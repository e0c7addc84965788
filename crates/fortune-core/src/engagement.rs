//! Engagement rate calculation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::post::PostMetrics;

/// Compute the engagement rate for a set of raw metrics.
///
/// `(likes + replies + reposts + shares) / views * 100`, rounded to two
/// decimal places. Zero views yields exactly `0.0`.
#[must_use]
pub fn engagement_rate(metrics: &PostMetrics) -> f64 {
    if metrics.views == 0 {
        return 0.0;
    }

    let interactions = metrics
        .likes
        .saturating_add(metrics.replies)
        .saturating_add(metrics.reposts)
        .saturating_add(metrics.shares);

    #[allow(clippy::cast_precision_loss)]
    let rate = interactions as f64 / metrics.views as f64 * 100.0;
    round_to(rate, 2)
}

/// Round `value` to `places` decimal places.
///
/// Ties go to the even digit and are judged on the exact binary value of
/// `value`, so `0.125` becomes `0.12` while `2.675` (stored just below the
/// half) becomes `2.67`. Non-finite input is returned unchanged.
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
