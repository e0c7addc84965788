//! In-process [`PostStore`] used by tests and local runs without Postgres.

use async_trait::async_trait;
use fortune_core::Post;
use tokio::sync::RwLock;

use crate::{DbError, PostStore};

/// A `Vec`-backed store that keeps posts in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `posts`, in the given order.
    #[must_use]
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Post>, DbError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.thread_id == thread_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Post>, DbError> {
        Ok(self.posts.read().await.clone())
    }

    async fn upsert_post(&self, post: &Post) -> Result<(), DbError> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.thread_id == post.thread_id) {
            Some(existing) => {
                existing.set_metrics(*post.metrics());
                existing.updated_at = post.updated_at;
            }
            None => posts.push(post.clone()),
        }
        Ok(())
    }

    async fn save_analysis(&self, post: &Post) -> Result<(), DbError> {
        let mut posts = self.posts.write().await;
        let existing = posts
            .iter_mut()
            .find(|p| p.thread_id == post.thread_id)
            .ok_or(DbError::NotFound)?;
        existing.analysis_result.clone_from(&post.analysis_result);
        existing.analysis_date = post.analysis_date;
        existing.analysis_cached = post.analysis_cached;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fortune_core::PostMetrics;

    use super::*;

    fn post(id: &str, views: u64, likes: u64) -> Post {
        Post::new(
            id,
            format!("content of {id}"),
            PostMetrics {
                views,
                likes,
                ..PostMetrics::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_metrics_only() {
        let store = MemoryPostStore::new();
        store.upsert_post(&post("a", 100, 5)).await.unwrap();

        let mut changed = post("a", 200, 20);
        changed.content = "edited".to_string();
        store.upsert_post(&changed).await.unwrap();

        let stored = store.find_by_id("a").await.unwrap().expect("post a");
        assert_eq!(store.len().await, 1);
        assert_eq!(stored.metrics().views, 200);
        assert!((stored.engagement_rate() - 10.0).abs() < f64::EPSILON);
        assert_eq!(stored.content, "content of a");
    }

    #[tokio::test]
    async fn upsert_does_not_touch_analysis() {
        let mut original = post("a", 100, 5);
        original.analysis_result = Some("kept".to_string());
        let store = MemoryPostStore::with_posts(vec![original]);

        store.upsert_post(&post("a", 300, 3)).await.unwrap();

        let stored = store.find_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.analysis_result.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn all_preserves_insertion_order() {
        let store = MemoryPostStore::new();
        for id in ["c", "a", "b"] {
            store.upsert_post(&post(id, 10, 1)).await.unwrap();
        }
        let ids: Vec<String> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.thread_id)
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn save_analysis_on_missing_post_is_not_found() {
        let store = MemoryPostStore::new();
        let err = store.save_analysis(&post("ghost", 1, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn save_analysis_writes_only_analysis_fields() {
        let store = MemoryPostStore::with_posts(vec![post("a", 100, 5)]);
        let mut analysed = post("a", 999, 999);
        analysed.analysis_result = Some("great post".to_string());
        analysed.analysis_date = Some(Utc::now());
        analysed.analysis_cached = true;

        store.save_analysis(&analysed).await.unwrap();

        let stored = store.find_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.analysis_result.as_deref(), Some("great post"));
        assert!(stored.analysis_cached);
        assert_eq!(stored.metrics().views, 100);
    }
}
