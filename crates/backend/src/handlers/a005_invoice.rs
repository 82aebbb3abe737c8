use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a005_invoice::aggregate::{Invoice, InvoiceDto};
use serde_json::json;

use crate::domain::a005_invoice;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

/// GET /api/cpfr/invoices
pub async fn list(CurrentUser(claims): CurrentUser) -> Result<Json<Vec<Invoice>>, StatusCode> {
    a005_invoice::service::list_for(&claims)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/cpfr/invoices/:id
pub async fn get_by_id(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a005_invoice::service::get_visible(uuid, &claims).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/cpfr/invoices
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<InvoiceDto>,
) -> ServiceResult<(StatusCode, Json<serde_json::Value>)> {
    let id = a005_invoice::service::create(dto, &claims).await?;
    Ok((StatusCode::CREATED, Json(json!({"id": id.to_string()}))))
}

/// PUT /api/cpfr/invoices/:id
pub async fn update(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<InvoiceDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    uuid::Uuid::parse_str(&id).map_err(|_| ServiceError::bad_request("Invalid ID"))?;
    dto.id = Some(id.clone());
    a005_invoice::service::update(dto, &claims).await?;
    Ok(Json(json!({"id": id})))
}

/// DELETE /api/cpfr/invoices/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a005_invoice::service::delete(uuid, &claims).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
