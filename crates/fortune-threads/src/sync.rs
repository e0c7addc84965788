//! Pull recent posts and their metrics from Threads into the post store.

use chrono::{DateTime, Utc};
use fortune_core::Post;
use fortune_db::{DbError, PostStore};
use serde::Serialize;
use thiserror::Error;

use crate::client::ThreadsClient;
use crate::error::ThreadsError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Threads(#[from] ThreadsError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Counts from one [`sync_posts`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Fetch the latest `limit` posts and their insights, then upsert them.
///
/// New posts are stored with their text, media type and publish time. Known
/// posts only get fresh metrics (which recomputes the engagement rate) and an
/// `updated_at` of `now`; their cached analysis is left alone.
///
/// # Errors
///
/// Returns [`SyncError`] on the first API or store failure. Posts written
/// before the failure stay written.
pub async fn sync_posts(
    client: &ThreadsClient,
    store: &dyn PostStore,
    limit: u32,
    now: DateTime<Utc>,
) -> Result<SyncReport, SyncError> {
    let media = client.get_user_media(limit).await?;
    let mut report = SyncReport::default();

    for item in media {
        let metrics = client.get_media_insights(&item.id).await?;

        let post = match store.find_by_id(&item.id).await? {
            Some(mut existing) => {
                existing.set_metrics(metrics);
                existing.updated_at = now;
                report.updated += 1;
                existing
            }
            None => {
                report.inserted += 1;
                let created_at = item.created_at();
                Post::new(item.id, item.text.unwrap_or_default(), metrics, now)
                    .with_media_type(item.media_type.unwrap_or_else(|| "TEXT".to_string()))
                    .with_created_at(created_at)
            }
        };

        store.upsert_post(&post).await?;
        report.synced += 1;
    }

    tracing::info!(
        synced = report.synced,
        inserted = report.inserted,
        updated = report.updated,
        "threads sync complete"
    );
    Ok(report)
}
