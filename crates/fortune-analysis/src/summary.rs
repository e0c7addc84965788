//! Fleet-wide dashboard statistics.

use fortune_core::engagement::round_to;
use fortune_core::Post;
use serde::Serialize;

use crate::text::truncate_chars;

const HIGHLIGHT_CONTENT_CHARS: usize = 100;

/// A best or worst post as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostHighlight {
    pub id: String,
    /// First 100 characters followed by `"..."`.
    pub content: String,
    pub engagement_rate: f64,
}

impl PostHighlight {
    fn of(post: &Post) -> Self {
        Self {
            id: post.thread_id.clone(),
            content: format!(
                "{}...",
                truncate_chars(&post.content, HIGHLIGHT_CONTENT_CHARS)
            ),
            engagement_rate: post.engagement_rate(),
        }
    }
}

/// Aggregate statistics over every stored post.
///
/// Every field is present on empty input: counts and totals are zero and the
/// highlights are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_posts: usize,
    pub avg_engagement: f64,
    pub total_views: u64,
    pub total_likes: u64,
    pub best_post: Option<PostHighlight>,
    pub worst_post: Option<PostHighlight>,
}

/// Summarize `posts`.
///
/// Best and worst are the first post in iteration order holding the maximum
/// or minimum engagement rate, so ties depend on the order of `posts`.
#[must_use]
pub fn summarize(posts: &[Post]) -> SummaryStats {
    let mut best: Option<&Post> = None;
    let mut worst: Option<&Post> = None;
    let mut rate_sum = 0.0_f64;
    let mut total_views = 0_u64;
    let mut total_likes = 0_u64;

    for post in posts {
        let rate = post.engagement_rate();
        rate_sum += rate;
        total_views = total_views.saturating_add(post.metrics().views);
        total_likes = total_likes.saturating_add(post.metrics().likes);

        if best.is_none_or(|b| rate > b.engagement_rate()) {
            best = Some(post);
        }
        if worst.is_none_or(|w| rate < w.engagement_rate()) {
            worst = Some(post);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_engagement = if posts.is_empty() {
        0.0
    } else {
        round_to(rate_sum / posts.len() as f64, 2)
    };

    SummaryStats {
        total_posts: posts.len(),
        avg_engagement,
        total_views,
        total_likes,
        best_post: best.map(PostHighlight::of),
        worst_post: worst.map(PostHighlight::of),
    }
}
