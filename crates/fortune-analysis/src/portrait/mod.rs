//! Creator portraits: batch statistics, a structured prompt, strict decoding
//! of the model's answer and a total fallback to the default portrait.

mod parse;
mod patterns;
mod prompt;
mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fortune_core::engagement::round_to;
use fortune_core::{AppConfig, FallbackStats, Post};

use crate::generator::{complete_within, TextGenerator};

pub use parse::{parse_portrait, PortraitParseError};
pub use patterns::{content_distribution, ContentCategory, EngagementPattern};
pub use types::{Archetype, Portrait};

use prompt::{build_portrait_prompt, BatchProfile};

const PORTRAIT_MAX_TOKENS: u32 = 600;
const PORTRAIT_TEMPERATURE: f32 = 0.8;

/// Why [`PortraitGenerator::generate`] fell back to the default portrait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoPosts,
    Generation(String),
    Parse(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPosts => f.write_str("no posts to analyze"),
            Self::Generation(e) => write!(f, "generation failed: {e}"),
            Self::Parse(e) => write!(f, "unparseable portrait: {e}"),
        }
    }
}

/// Either a fully generated portrait or the full default; never partial.
#[derive(Debug, Clone, PartialEq)]
pub enum PortraitOutcome {
    Generated(Portrait),
    Fallback {
        portrait: Portrait,
        reason: FallbackReason,
    },
}

impl PortraitOutcome {
    #[must_use]
    pub fn portrait(&self) -> &Portrait {
        match self {
            Self::Generated(portrait) | Self::Fallback { portrait, .. } => portrait,
        }
    }

    #[must_use]
    pub fn into_portrait(self) -> Portrait {
        match self {
            Self::Generated(portrait) | Self::Fallback { portrait, .. } => portrait,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Builds creator portraits through the text generator.
pub struct PortraitGenerator {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    fallback_stats: FallbackStats,
}

impl fmt::Debug for PortraitGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortraitGenerator")
            .field("timeout", &self.timeout)
            .field("fallback_stats", &self.fallback_stats)
            .finish_non_exhaustive()
    }
}

impl PortraitGenerator {
    #[must_use]
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        timeout: Duration,
        fallback_stats: FallbackStats,
    ) -> Self {
        Self {
            generator,
            timeout,
            fallback_stats,
        }
    }

    #[must_use]
    pub fn from_app_config(generator: Arc<dyn TextGenerator>, config: &AppConfig) -> Self {
        Self::new(
            generator,
            Duration::from_secs(config.generation_timeout_secs),
            config.portrait_fallback_stats,
        )
    }

    /// Generate a portrait for `posts`.
    ///
    /// Empty input returns the default portrait without calling the
    /// generator. A generator error, timeout or unparseable answer also
    /// returns the default; with [`FallbackStats::Zeroed`] its totals stay at
    /// zero whatever the batch size, with [`FallbackStats::FromBatch`] they
    /// report the real batch.
    pub async fn generate(&self, posts: &[Post]) -> PortraitOutcome {
        if posts.is_empty() {
            return PortraitOutcome::Fallback {
                portrait: Portrait::default_portrait(),
                reason: FallbackReason::NoPosts,
            };
        }

        let profile = profile(posts);
        let prompt = build_portrait_prompt(&profile, posts);

        let reason = match complete_within(
            self.generator.as_ref(),
            self.timeout,
            &prompt,
            PORTRAIT_MAX_TOKENS,
            PORTRAIT_TEMPERATURE,
        )
        .await
        {
            Ok(text) => match parse_portrait(&text) {
                Ok(mut portrait) => {
                    portrait.total_posts = profile.total_posts;
                    portrait.avg_engagement = round_to(profile.avg_engagement, 1);
                    tracing::info!(
                        archetype = %portrait.archetype,
                        total_posts = portrait.total_posts,
                        "creator portrait generated"
                    );
                    return PortraitOutcome::Generated(portrait);
                }
                Err(e) => FallbackReason::Parse(e.to_string()),
            },
            Err(e) => FallbackReason::Generation(e.to_string()),
        };

        tracing::warn!(%reason, total_posts = profile.total_posts, "falling back to default portrait");
        let mut portrait = Portrait::default_portrait();
        if self.fallback_stats == FallbackStats::FromBatch {
            portrait.total_posts = profile.total_posts;
            portrait.avg_engagement = round_to(profile.avg_engagement, 1);
        }
        PortraitOutcome::Fallback { portrait, reason }
    }
}

#[allow(clippy::cast_precision_loss)]
fn profile(posts: &[Post]) -> BatchProfile {
    let avg_engagement =
        posts.iter().map(Post::engagement_rate).sum::<f64>() / posts.len().max(1) as f64;
    BatchProfile {
        total_posts: posts.len(),
        avg_engagement,
        content_dna: content_distribution(posts),
        pattern: EngagementPattern::from_average(avg_engagement),
    }
}

#[cfg(test)]
#[path = "portrait_test.rs"]
mod tests;
