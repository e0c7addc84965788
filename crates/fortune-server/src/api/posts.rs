use axum::{extract::State, Extension, Json};
use fortune_analysis::{summarize, SummaryStats};
use fortune_core::Post;

use super::{map_db_error, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Post>>>, ApiError> {
    let posts = state
        .store
        .all()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, posts)))
}

pub(super) async fn analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SummaryStats>>, ApiError> {
    let posts = state
        .store
        .all()
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, summarize(&posts))))
}
