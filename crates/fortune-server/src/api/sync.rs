use axum::{extract::State, Extension, Json};
use fortune_threads::{sync_posts, SyncReport};
use serde::Serialize;

use super::{ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct SyncData {
    status: &'static str,
    message: String,
    #[serde(flatten)]
    report: SyncReport,
}

pub(super) async fn sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncData>>, ApiError> {
    let Some(client) = state.threads.as_deref() else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "Threads credentials are not configured",
        ));
    };

    match sync_posts(
        client,
        state.store.as_ref(),
        state.sync_limit,
        state.clock.now(),
    )
    .await
    {
        Ok(report) => Ok(Json(ApiResponse::new(
            req_id.0,
            SyncData {
                status: "success",
                message: format!("Synced {} posts", report.synced),
                report,
            },
        ))),
        Err(e) => {
            tracing::error!(error = %e, "threads sync failed");
            Err(ApiError::new(
                req_id.0,
                "internal_error",
                format!("Sync failed: {e}"),
            ))
        }
    }
}
