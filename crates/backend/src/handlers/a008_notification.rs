use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a008_notification::aggregate::{
    BulkNotificationRequest, BulkNotificationResult, CreateNotificationParams, Notification,
    NotificationListQuery,
};
use serde_json::json;

use crate::domain::a008_notification;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/notifications
pub async fn list(
    CurrentUser(claims): CurrentUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let notifications: Vec<Notification> = a008_notification::service::list(&claims.sub, &query)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let unread_count = a008_notification::service::unread_count(&claims.sub)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(json!({
        "notifications": notifications,
        "unread_count": unread_count,
    })))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<serde_json::Value>, StatusCode> {
    a008_notification::service::unread_count(&claims.sub)
        .await
        .map(|count| Json(json!({"count": count})))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/notifications (admin)
pub async fn create(
    Json(params): Json<CreateNotificationParams>,
) -> Result<Json<Notification>, (StatusCode, Json<serde_json::Value>)> {
    match a008_notification::service::create(params).await {
        Ok(Some(n)) => Ok(Json(n)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )),
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()})))),
    }
}

/// POST /api/notifications/bulk (admin)
pub async fn create_bulk(Json(request): Json<BulkNotificationRequest>) -> Json<BulkNotificationResult> {
    Json(a008_notification::service::create_bulk(&request.user_ids, request.params).await)
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a008_notification::service::mark_read(uuid, &claims.sub).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<serde_json::Value>, StatusCode> {
    a008_notification::service::mark_all_read(&claims.sub)
        .await
        .map(|updated| Json(json!({"updated": updated})))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// DELETE /api/notifications/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a008_notification::service::delete(uuid, &claims.sub).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
