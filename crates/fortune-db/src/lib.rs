use std::time::Duration;

use async_trait::async_trait;
use fortune_core::{AppConfig, Post};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod memory;
pub mod posts;

pub use memory::MemoryPostStore;
pub use posts::{PgPostStore, PostRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/fortune-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Record store for synced posts.
///
/// Each write method is a single atomic statement; a failed write leaves the
/// previously stored row untouched. [`PostStore::all`] returns posts in
/// insertion order so aggregate tie-breaks are reproducible.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Look up a post by its external thread id.
    async fn find_by_id(&self, thread_id: &str) -> Result<Option<Post>, DbError>;

    /// Every stored post, oldest insert first.
    async fn all(&self) -> Result<Vec<Post>, DbError>;

    /// Insert a new post, or replace the metrics of an existing one.
    ///
    /// Content, media type and `created_at` are only written on insert.
    /// Analysis fields are never touched.
    async fn upsert_post(&self, post: &Post) -> Result<(), DbError>;

    /// Persist the analysis fields of an existing post.
    ///
    /// Returns [`DbError::NotFound`] if no row matches the thread id.
    async fn save_analysis(&self, post: &Post) -> Result<(), DbError>;

    /// Verify the store is reachable.
    async fn health_check(&self) -> Result<(), DbError>;
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}
