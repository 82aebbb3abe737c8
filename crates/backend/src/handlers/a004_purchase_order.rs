use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a004_purchase_order::aggregate::{PurchaseOrder, PurchaseOrderDto};
use serde_json::json;

use crate::domain::a004_purchase_order;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

/// GET /api/cpfr/purchase-orders
pub async fn list(CurrentUser(claims): CurrentUser) -> Result<Json<Vec<PurchaseOrder>>, StatusCode> {
    a004_purchase_order::service::list_for(&claims)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/cpfr/purchase-orders/:id
pub async fn get_by_id(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PurchaseOrder>, StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a004_purchase_order::service::get_visible(uuid, &claims).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/cpfr/purchase-orders
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<PurchaseOrderDto>,
) -> ServiceResult<(StatusCode, Json<serde_json::Value>)> {
    let id = a004_purchase_order::service::create(dto, &claims).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id.to_string()}))))
}

/// PUT /api/cpfr/purchase-orders/:id
pub async fn update(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<PurchaseOrderDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    uuid::Uuid::parse_str(&id).map_err(|_| ServiceError::bad_request("Invalid ID"))?;
    dto.id = Some(id.clone());
    a004_purchase_order::service::update(dto, &claims).await?;
    Ok(Json(json!({"id": id})))
}

/// DELETE /api/cpfr/purchase-orders/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a004_purchase_order::service::delete(uuid, &claims).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
