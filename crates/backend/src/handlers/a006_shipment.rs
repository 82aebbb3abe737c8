use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a003_sales_forecast::aggregate::MilestoneStatusRequest;
use contracts::domain::a006_shipment::aggregate::{Shipment, ShipmentDto, ShipmentStatusResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a006_shipment;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct ShipmentListQuery {
    pub forecast_id: Option<String>,
}

/// GET /api/cpfr/shipments?forecast_id=
pub async fn list(Query(query): Query<ShipmentListQuery>) -> Result<Json<Vec<Shipment>>, StatusCode> {
    let result = match query.forecast_id.as_deref() {
        Some(forecast_id) => a006_shipment::service::list_by_forecast(forecast_id).await,
        None => a006_shipment::service::list_all().await,
    };
    result
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/cpfr/shipments/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Shipment>, StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a006_shipment::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/cpfr/shipments
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<ShipmentDto>,
) -> ServiceResult<(StatusCode, Json<serde_json::Value>)> {
    let id = a006_shipment::service::create(dto, claims.sub).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "id": id.to_string()})),
    ))
}

/// PUT /api/cpfr/shipments/:id
pub async fn update(
    Path(id): Path<String>,
    Json(mut dto): Json<ShipmentDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    uuid::Uuid::parse_str(&id).map_err(|_| ServiceError::bad_request("Invalid ID"))?;
    dto.id = Some(id.clone());
    a006_shipment::service::update(dto)
        .await
        .map_err(|e| ServiceError::bad_request(e.to_string()))?;
    Ok(Json(json!({"id": id})))
}

/// PUT /api/cpfr/shipments/:id/status
pub async fn update_status(
    Path(id): Path<String>,
    Json(request): Json<MilestoneStatusRequest>,
) -> ServiceResult<Json<ShipmentStatusResponse>> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| ServiceError::bad_request("Invalid ID"))?;
    a006_shipment::service::update_status(uuid, request)
        .await
        .map(Json)
}

/// DELETE /api/cpfr/shipments/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a006_shipment::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
