use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a002_product_sku::aggregate::{ProductSku, ProductSkuDto};
use serde_json::json;

use crate::domain::a002_product_sku;

/// GET /api/product-sku
pub async fn list_all() -> Result<Json<Vec<ProductSku>>, StatusCode> {
    match a002_product_sku::service::list_all().await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/product-sku/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<ProductSku>, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a002_product_sku::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/product-sku
pub async fn upsert(
    Json(dto): Json<ProductSkuDto>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let result = match dto.id.clone() {
        Some(id) => a002_product_sku::service::update(dto).await.map(|_| id),
        None => a002_product_sku::service::create(dto)
            .await
            .map(|id| id.to_string()),
    };

    match result {
        Ok(id) => Ok(Json(json!({"id": id}))),
        Err(e) => Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()})))),
    }
}

/// DELETE /api/product-sku/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a002_product_sku::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
