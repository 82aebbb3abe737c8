use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a007_warehouse::aggregate::{Warehouse, WarehouseDto};
use serde_json::json;

use crate::domain::a007_warehouse;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/inventory/warehouses
pub async fn list_all() -> Result<Json<Vec<Warehouse>>, StatusCode> {
    match a007_warehouse::service::list_all().await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/inventory/warehouses/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Warehouse>, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a007_warehouse::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/inventory/warehouses
///
/// New warehouses belong to the caller's organization.
pub async fn upsert(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<WarehouseDto>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let result = match dto.id.clone() {
        Some(id) => a007_warehouse::service::update(dto).await.map(|_| id),
        None => a007_warehouse::service::create(dto, claims.organization_id)
            .await
            .map(|id| id.to_string()),
    };

    match result {
        Ok(id) => Ok(Json(json!({"id": id}))),
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()})))),
    }
}

/// DELETE /api/inventory/warehouses/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a007_warehouse::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
