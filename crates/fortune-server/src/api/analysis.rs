use axum::{extract::State, Extension, Json};
use fortune_analysis::{Portrait, PortraitOutcome, PostAnalysis};
use fortune_share::{share_urls, ShareUrls};
use serde::{Deserialize, Serialize};

use super::{map_db_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    #[serde(default)]
    post_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeData {
    status: &'static str,
    message: String,
    analyzed_count: usize,
    results: Vec<PostAnalysis>,
    skipped_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ShareableContent {
    ig_story_image: String,
    share_urls: ShareUrls,
}

#[derive(Debug, Serialize)]
pub(super) struct PortraitData {
    status: &'static str,
    portrait: Portrait,
    fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<String>,
    shareable_content: ShareableContent,
}

pub(super) async fn analyze_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyzeData>>, ApiError> {
    if body.post_ids.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "No post IDs provided",
        ));
    }

    let batch = state
        .analyzer
        .analyze_batch(state.store.as_ref(), &body.post_ids)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        AnalyzeData {
            status: "success",
            message: format!("Analyzed {} posts", batch.analyzed_count),
            analyzed_count: batch.analyzed_count,
            results: batch.results,
            skipped_ids: batch.skipped_ids,
        },
    )))
}

pub(super) async fn generate_portrait(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PortraitData>>, ApiError> {
    let posts = state
        .store
        .all()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if posts.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "No posts found. Please sync data first.",
        ));
    }

    let outcome = state.portraits.generate(&posts).await;
    let fallback_reason = match &outcome {
        PortraitOutcome::Generated(_) => None,
        PortraitOutcome::Fallback { reason, .. } => {
            tracing::warn!(reason = %reason, "serving default portrait");
            Some(reason.to_string())
        }
    };
    let fallback = outcome.is_fallback();
    let portrait = outcome.into_portrait();

    let renderer = std::sync::Arc::clone(&state.renderer);
    let card_source = portrait.clone();
    let image = tokio::task::spawn_blocking(move || renderer.render(&card_source))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "story card render task failed");
            ApiError::new(req_id.0.clone(), "internal_error", "image rendering failed")
        })?;

    let urls = share_urls(&portrait);

    Ok(Json(ApiResponse::new(
        req_id.0,
        PortraitData {
            status: "success",
            portrait,
            fallback,
            fallback_reason,
            shareable_content: ShareableContent {
                ig_story_image: image.data_url(),
                share_urls: urls,
            },
        },
    )))
}
