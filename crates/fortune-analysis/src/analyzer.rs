//! Per-post analysis: cache check, prompt, generation and write-back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fortune_core::{AppConfig, Clock, Post};
use fortune_db::{DbError, PostStore};
use serde::Serialize;

use crate::cache::AnalysisCache;
use crate::generator::{complete_within, TextGenerator};
use crate::text::truncate_chars;

const CONTENT_PROMPT_CHARS: usize = 500;
const ANALYSIS_MAX_TOKENS: u32 = 150;
const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// Knobs for [`PostAnalyzer`], usually derived from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSettings {
    /// Batch cap; longer id lists are truncated before iteration.
    pub max_posts_per_analysis: usize,
    /// Staleness window for cached analysis text.
    pub cache_analysis_days: i64,
    /// Caller-side deadline for a single generator call.
    pub generation_timeout: Duration,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_posts_per_analysis: 10,
            cache_analysis_days: 30,
            generation_timeout: Duration::from_secs(30),
        }
    }
}

impl AnalyzerSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_posts_per_analysis: config.max_posts_per_analysis,
            cache_analysis_days: config.cache_analysis_days,
            generation_timeout: Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

/// What [`PostAnalyzer::analyze`] produced for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "analysis", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// A fresh stored analysis was reused; the generator was not called.
    Cached(String),
    /// New text from the generator, now recorded on the post.
    Generated(String),
    /// The generator failed; the post was left untouched.
    Unavailable(String),
}

impl AnalysisOutcome {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Cached(text) | Self::Generated(text) | Self::Unavailable(text) => text,
        }
    }

    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Cached(text) | Self::Generated(text) | Self::Unavailable(text) => text,
        }
    }
}

/// Outcome for one post of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct PostAnalysis {
    pub thread_id: String,
    pub outcome: AnalysisOutcome,
}

/// Result of [`PostAnalyzer::analyze_batch`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchAnalysis {
    /// Posts that were found and processed, degraded results included.
    pub analyzed_count: usize,
    pub results: Vec<PostAnalysis>,
    /// Ids within the cap that matched no stored post.
    pub skipped_ids: Vec<String>,
}

/// Produces and caches short critiques of individual posts.
pub struct PostAnalyzer {
    generator: Arc<dyn TextGenerator>,
    cache: AnalysisCache,
    settings: AnalyzerSettings,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl std::fmt::Debug for PostAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostAnalyzer")
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PostAnalyzer {
    #[must_use]
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        clock: Arc<dyn Clock>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            generator,
            cache: AnalysisCache::new(settings.cache_analysis_days, clock),
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Analyze one post in memory.
    ///
    /// A fresh cached result is returned without calling the generator. On
    /// success the analysis fields of `post` are updated; on failure `post` is
    /// left as it was and the outcome carries `"Analysis unavailable: <why>"`.
    pub async fn analyze(&self, post: &mut Post) -> AnalysisOutcome {
        if let Some(cached) = self.cache.fresh_result(post) {
            tracing::debug!(thread_id = %post.thread_id, "analysis cache hit");
            return AnalysisOutcome::Cached(cached.to_string());
        }

        let prompt = build_analysis_prompt(post);
        match complete_within(
            self.generator.as_ref(),
            self.settings.generation_timeout,
            &prompt,
            ANALYSIS_MAX_TOKENS,
            ANALYSIS_TEMPERATURE,
        )
        .await
        {
            Ok(text) => {
                self.cache.record(post, text.clone());
                tracing::info!(thread_id = %post.thread_id, "post analysis generated");
                AnalysisOutcome::Generated(text)
            }
            Err(err) => {
                tracing::warn!(thread_id = %post.thread_id, error = %err, "post analysis unavailable");
                AnalysisOutcome::Unavailable(format!("Analysis unavailable: {err}"))
            }
        }
    }

    /// Analyze up to `max_posts_per_analysis` stored posts, in request order.
    ///
    /// Ids past the cap are ignored. Ids with no stored post are skipped and
    /// not counted. Each post is read, analyzed and written back under a
    /// per-post lock so concurrent requests for the same post do not both
    /// regenerate or interleave stale reads with fresh writes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store fails; generator failures never
    /// surface here.
    pub async fn analyze_batch(
        &self,
        store: &dyn PostStore,
        thread_ids: &[String],
    ) -> Result<BatchAnalysis, DbError> {
        let capped = &thread_ids[..thread_ids.len().min(self.settings.max_posts_per_analysis)];
        if capped.len() < thread_ids.len() {
            tracing::info!(
                requested = thread_ids.len(),
                cap = self.settings.max_posts_per_analysis,
                "analysis batch truncated"
            );
        }

        let mut batch = BatchAnalysis::default();
        for thread_id in capped {
            let result = self.analyze_stored(store, thread_id).await;
            self.prune_locks();
            match result? {
                Some(outcome) => {
                    batch.analyzed_count += 1;
                    batch.results.push(PostAnalysis {
                        thread_id: thread_id.clone(),
                        outcome,
                    });
                }
                None => {
                    tracing::debug!(%thread_id, "post not found, skipping");
                    batch.skipped_ids.push(thread_id.clone());
                }
            }
        }

        Ok(batch)
    }

    async fn analyze_stored(
        &self,
        store: &dyn PostStore,
        thread_id: &str,
    ) -> Result<Option<AnalysisOutcome>, DbError> {
        let lock = self.lock_for(thread_id);
        let _guard = lock.lock().await;

        let Some(mut post) = store.find_by_id(thread_id).await? else {
            return Ok(None);
        };
        let outcome = self.analyze(&mut post).await;
        if matches!(outcome, AnalysisOutcome::Generated(_)) {
            store.save_analysis(&post).await?;
        }
        Ok(Some(outcome))
    }

    fn lock_for(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(thread_id.to_string()).or_default())
    }

    fn prune_locks(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

fn build_analysis_prompt(post: &Post) -> String {
    let m = post.metrics();
    let content = truncate_chars(&post.content, CONTENT_PROMPT_CHARS);
    let ellipsis = if content.len() < post.content.len() {
        "..."
    } else {
        ""
    };
    format!(
        "Analyze this Threads post performance:\n\
         Content: {content}{ellipsis}\n\
         Metrics: Views: {}, Likes: {}, Replies: {}, Reposts: {}, Shares: {}\n\
         Engagement Rate: {:.2}%\n\n\
         Provide a brief analysis covering:\n\
         1. Content type and style\n\
         2. Why it performed this way\n\
         3. One specific improvement suggestion\n\n\
         Keep response under 100 words.",
        m.views,
        m.likes,
        m.replies,
        m.reposts,
        m.shares,
        post.engagement_rate(),
    )
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
