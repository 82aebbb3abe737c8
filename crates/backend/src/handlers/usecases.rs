use axum::{extract::Path, http::StatusCode, Json};
use contracts::usecases::u501_amazon_financial_sync::{SyncProgress, SyncRequest, SyncResponse};
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;

use crate::usecases::u501_amazon_financial_sync::{ProgressTracker, SyncExecutor};

static FINANCIAL_SYNC_EXECUTOR: Lazy<Arc<SyncExecutor>> = Lazy::new(|| {
    let tracker = Arc::new(ProgressTracker::new());
    Arc::new(SyncExecutor::new(tracker))
});

/// POST /api/u501/sync/start
pub async fn u501_start_sync(
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, (StatusCode, Json<serde_json::Value>)> {
    match FINANCIAL_SYNC_EXECUTOR.start_sync(request) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Failed to start Amazon financial sync: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))))
        }
    }
}

/// GET /api/u501/sync/:session_id/progress
pub async fn u501_get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<SyncProgress>, StatusCode> {
    match FINANCIAL_SYNC_EXECUTOR.get_progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(StatusCode::NOT_FOUND),
    }
}
