//! The post record and its raw metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::engagement_rate;

/// Raw interaction counts reported by the platform.
///
/// Missing keys deserialize as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMetrics {
    pub views: u64,
    pub likes: u64,
    pub replies: u64,
    pub reposts: u64,
    pub shares: u64,
}

/// A synced post with its derived engagement rate and cached analysis.
///
/// The raw metrics and the engagement rate are private: the only way to change
/// them is [`Post::set_metrics`], which recomputes the rate from the new counts.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub thread_id: String,
    pub content: String,
    pub media_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    metrics: PostMetrics,
    engagement_rate: f64,
    pub analysis_result: Option<String>,
    pub analysis_date: Option<DateTime<Utc>>,
    pub analysis_cached: bool,
}

impl Post {
    /// Create a post with no analysis attached.
    #[must_use]
    pub fn new(
        thread_id: impl Into<String>,
        content: impl Into<String>,
        metrics: PostMetrics,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            content: content.into(),
            media_type: "TEXT".to_string(),
            created_at: None,
            updated_at,
            metrics,
            engagement_rate: engagement_rate(&metrics),
            analysis_result: None,
            analysis_date: None,
            analysis_cached: false,
        }
    }

    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    #[must_use]
    pub fn metrics(&self) -> &PostMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn engagement_rate(&self) -> f64 {
        self.engagement_rate
    }

    /// Replace the raw metrics and recompute the engagement rate.
    pub fn set_metrics(&mut self, metrics: PostMetrics) {
        self.metrics = metrics;
        self.engagement_rate = engagement_rate(&metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post::new(
            "test_123",
            "This is a test post about AI technology",
            PostMetrics {
                views: 1000,
                likes: 50,
                ..PostMetrics::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_post_derives_engagement_rate() {
        let post = sample_post();
        assert!((post.engagement_rate() - 5.0).abs() < f64::EPSILON);
        assert!(post.analysis_result.is_none());
        assert!(!post.analysis_cached);
        assert_eq!(post.media_type, "TEXT");
    }

    #[test]
    fn set_metrics_recomputes_engagement_rate() {
        let mut post = sample_post();
        post.set_metrics(PostMetrics {
            views: 500,
            likes: 25,
            replies: 5,
            reposts: 2,
            shares: 1,
        });
        assert!((post.engagement_rate() - 6.6).abs() < f64::EPSILON);
        assert_eq!(post.metrics().views, 500);
    }

    #[test]
    fn set_metrics_to_zero_views_zeroes_rate() {
        let mut post = sample_post();
        post.set_metrics(PostMetrics::default());
        assert_eq!(post.engagement_rate(), 0.0);
    }

    #[test]
    fn serializes_metrics_flat() {
        let json = serde_json::to_value(sample_post()).expect("serialize post");
        assert_eq!(json["views"], 1000);
        assert_eq!(json["likes"], 50);
        assert_eq!(json["engagement_rate"], 5.0);
        assert_eq!(json["thread_id"], "test_123");
    }
}
