//! Postgres-backed [`PostStore`] over the `posts` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fortune_core::{Post, PostMetrics};
use sqlx::PgPool;

use crate::{DbError, PostStore};

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
///
/// The stored `engagement_rate` column is a read-side convenience for SQL
/// consumers; [`PostRow::into_post`] recomputes the rate from the raw counts.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub thread_id: String,
    pub content: String,
    pub media_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
    pub shares: i64,
    pub engagement_rate: f64,
    pub analysis_result: Option<String>,
    pub analysis_date: Option<DateTime<Utc>>,
    pub analysis_cached: bool,
}

impl PostRow {
    #[must_use]
    pub fn metrics(&self) -> PostMetrics {
        let count = |v: i64| u64::try_from(v).unwrap_or(0);
        PostMetrics {
            views: count(self.views),
            likes: count(self.likes),
            replies: count(self.replies),
            reposts: count(self.reposts),
            shares: count(self.shares),
        }
    }

    #[must_use]
    pub fn into_post(self) -> Post {
        let metrics = self.metrics();
        let mut post = Post::new(self.thread_id, self.content, metrics, self.updated_at)
            .with_media_type(self.media_type)
            .with_created_at(self.created_at);
        post.analysis_result = self.analysis_result;
        post.analysis_date = self.analysis_date;
        post.analysis_cached = self.analysis_cached;
        post
    }
}

fn to_db_count(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

const SELECT_COLUMNS: &str = "SELECT id, thread_id, content, media_type, created_at, updated_at, \
     views, likes, replies, reposts, shares, engagement_rate, \
     analysis_result, analysis_date, analysis_cached \
     FROM posts";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch a single post by thread id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post_by_thread_id(
    pool: &PgPool,
    thread_id: &str,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!("{SELECT_COLUMNS} WHERE thread_id = $1"))
        .bind(thread_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// List every post ordered by insertion id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_posts(pool: &PgPool) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Insert a post or refresh the metrics of an existing row.
///
/// On conflict only the raw counts, the derived rate and `updated_at` change.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_post(pool: &PgPool, post: &Post) -> Result<(), DbError> {
    let m = post.metrics();
    sqlx::query(
        "INSERT INTO posts \
             (thread_id, content, media_type, created_at, updated_at, \
              views, likes, replies, reposts, shares, engagement_rate) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (thread_id) DO UPDATE SET \
             views = EXCLUDED.views, \
             likes = EXCLUDED.likes, \
             replies = EXCLUDED.replies, \
             reposts = EXCLUDED.reposts, \
             shares = EXCLUDED.shares, \
             engagement_rate = EXCLUDED.engagement_rate, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(&post.thread_id)
    .bind(&post.content)
    .bind(&post.media_type)
    .bind(post.created_at)
    .bind(post.updated_at)
    .bind(to_db_count(m.views))
    .bind(to_db_count(m.likes))
    .bind(to_db_count(m.replies))
    .bind(to_db_count(m.reposts))
    .bind(to_db_count(m.shares))
    .bind(post.engagement_rate())
    .execute(pool)
    .await?;

    Ok(())
}

/// Write the analysis columns of an existing post.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the update fails.
pub async fn update_post_analysis(pool: &PgPool, post: &Post) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts SET \
             analysis_result = $2, \
             analysis_date = $3, \
             analysis_cached = $4 \
         WHERE thread_id = $1",
    )
    .bind(&post.thread_id)
    .bind(&post.analysis_result)
    .bind(post.analysis_date)
    .bind(post.analysis_cached)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// [`PostStore`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Post>, DbError> {
        Ok(get_post_by_thread_id(&self.pool, thread_id)
            .await?
            .map(PostRow::into_post))
    }

    async fn all(&self) -> Result<Vec<Post>, DbError> {
        Ok(list_posts(&self.pool)
            .await?
            .into_iter()
            .map(PostRow::into_post)
            .collect())
    }

    async fn upsert_post(&self, post: &Post) -> Result<(), DbError> {
        upsert_post(&self.pool, post).await
    }

    async fn save_analysis(&self, post: &Post) -> Result<(), DbError> {
        update_post_analysis(&self.pool, post).await
    }

    async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
