//! Live integration tests for `PgPostStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database from the sqlx test
//! harness. `"../../migrations"` is relative to `crates/fortune-db/`.

use chrono::{TimeZone, Utc};
use fortune_core::{Post, PostMetrics};
use fortune_db::{DbError, PgPostStore, PostStore};

fn metrics(views: u64, likes: u64) -> PostMetrics {
    PostMetrics {
        views,
        likes,
        ..PostMetrics::default()
    }
}

fn post(id: &str, content: &str, views: u64, likes: u64) -> Post {
    Post::new(
        id,
        content,
        metrics(views, likes),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_inserts_then_refreshes_metrics_only(pool: sqlx::PgPool) {
    let store = PgPostStore::new(pool);

    store
        .upsert_post(&post("t1", "original", 100, 5).with_media_type("IMAGE"))
        .await
        .expect("insert");

    let mut analyzed = store.find_by_id("t1").await.unwrap().expect("row");
    analyzed.analysis_result = Some("Nice".to_string());
    analyzed.analysis_date = Some(Utc::now());
    analyzed.analysis_cached = true;
    store.save_analysis(&analyzed).await.expect("save analysis");

    let mut refreshed = post("t1", "changed upstream", 1000, 50);
    refreshed.updated_at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    store.upsert_post(&refreshed).await.expect("update");

    let stored = store.find_by_id("t1").await.unwrap().expect("row");
    assert_eq!(stored.content, "original");
    assert_eq!(stored.media_type, "IMAGE");
    assert_eq!(stored.metrics().views, 1000);
    assert!((stored.engagement_rate() - 5.0).abs() < f64::EPSILON);
    assert_eq!(stored.updated_at, refreshed.updated_at);
    assert_eq!(stored.analysis_result.as_deref(), Some("Nice"));
    assert!(stored.analysis_cached);
}

#[sqlx::test(migrations = "../../migrations")]
async fn save_analysis_for_unknown_post_is_not_found(pool: sqlx::PgPool) {
    let store = PgPostStore::new(pool);

    let err = store
        .save_analysis(&post("ghost", "", 0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn all_returns_posts_in_insertion_order(pool: sqlx::PgPool) {
    let store = PgPostStore::new(pool);
    for id in ["c", "a", "b"] {
        store.upsert_post(&post(id, id, 10, 1)).await.expect("insert");
    }

    let ids: Vec<String> = store
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.thread_id)
        .collect();
    assert_eq!(ids, ["c", "a", "b"]);
    store.health_check().await.expect("healthy");
}
