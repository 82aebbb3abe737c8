use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a003_sales_forecast::aggregate::{
    MilestoneStatusRequest, SalesForecast, SalesForecastDto,
};
use serde_json::json;

use crate::domain::a003_sales_forecast;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

fn parse_id(id: &str) -> ServiceResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id).map_err(|_| ServiceError::bad_request("Invalid ID"))
}

/// GET /api/cpfr/forecasts
pub async fn list_all() -> Result<Json<Vec<SalesForecast>>, StatusCode> {
    match a003_sales_forecast::service::list_all().await {
        Ok(v) => Ok(Json(v)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /api/cpfr/forecasts/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<SalesForecast>> {
    a003_sales_forecast::service::get_by_id(parse_id(&id)?)
        .await?
        .map(Json)
        .ok_or_else(|| ServiceError::not_found("Forecast not found"))
}

/// POST /api/cpfr/forecasts
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<SalesForecastDto>,
) -> ServiceResult<(StatusCode, Json<serde_json::Value>)> {
    let id = a003_sales_forecast::service::create(dto, &claims).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "id": id.to_string()})),
    ))
}

/// PUT /api/cpfr/forecasts/:id
pub async fn update(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<SalesForecastDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    parse_id(&id)?;
    dto.id = Some(id.clone());
    a003_sales_forecast::service::update(dto, &claims).await?;
    Ok(Json(json!({"id": id})))
}

/// PUT /api/cpfr/forecasts/:id/status
pub async fn update_status(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<MilestoneStatusRequest>,
) -> ServiceResult<Json<serde_json::Value>> {
    let forecast =
        a003_sales_forecast::service::update_status(parse_id(&id)?, request, &claims).await?;
    Ok(Json(json!({"success": true, "forecast": forecast})))
}

/// DELETE /api/cpfr/forecasts/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> ServiceResult<StatusCode> {
    if a003_sales_forecast::service::delete(parse_id(&id)?, &claims).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::not_found("Forecast not found"))
    }
}
