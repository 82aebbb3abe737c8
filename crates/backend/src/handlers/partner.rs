use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::Response,
    Json,
};
use contracts::domain::a001_organization::aggregate::Organization;
use contracts::domain::a010_production_file::aggregate::{ProductionFile, ProductionFileQuery};
use serde_json::json;
use std::collections::HashMap;

use crate::domain::{
    a001_organization, a002_product_sku, a003_sales_forecast, a010_production_file,
};
use crate::handlers::a010_production_file::{file_response, read_form};
use crate::shared::errors::ServiceError;
use crate::system::auth::extractor::CurrentApiKey;
use crate::system::users;

pub const READ_FORECASTS: &str = "read_forecasts";

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Partner API failure: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

/// GET /api/v1/partner/forecasts
///
/// Active SKUs plus the forecasts entered by members of the key's organization.
pub async fn forecasts(
    CurrentApiKey(key): CurrentApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !key.has_permission(READ_FORECASTS) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": format!("API key lacks the {} permission", READ_FORECASTS)})),
        ));
    }

    let members: Vec<String> = users::service::list_by_organization(&key.organization_id)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|u| u.id)
        .collect();
    let forecasts = a003_sales_forecast::service::list_created_by(&members)
        .await
        .map_err(internal)?;
    let skus = a002_product_sku::service::list_active()
        .await
        .map_err(internal)?;

    tracing::info!(
        "Partner {} read {} forecasts",
        key.organization_code,
        forecasts.len()
    );
    Ok(Json(json!({
        "success": true,
        "organization": key.organization_code,
        "skus": skus,
        "forecasts": forecasts,
    })))
}

/// Partner error body: `{success: false, error, code}`
fn partner_error(err: ServiceError) -> ApiError {
    let status = err.status_code();
    let code = match status {
        StatusCode::BAD_REQUEST => "INVALID_REQUEST",
        StatusCode::FORBIDDEN => "INSUFFICIENT_PERMISSIONS",
        StatusCode::NOT_FOUND => "FILE_NOT_FOUND",
        _ => "INTERNAL_ERROR",
    };
    let message = match &err {
        ServiceError::Internal(e) => {
            tracing::error!("Partner API failure: {:#}", e);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    (
        status,
        Json(json!({"success": false, "error": message, "code": code})),
    )
}

fn file_json(file: &ProductionFile, organizations: &HashMap<String, Organization>) -> serde_json::Value {
    let org = organizations.get(&file.organization_id);
    json!({
        "id": file.base.id.value().to_string(),
        "fileName": file.file_name,
        "fileSize": file.file_size,
        "contentType": file.content_type,
        "shipmentNumber": file.bdi_shipment_number,
        "deviceCount": file.device_metadata.device_count,
        "deviceMetadata": file.device_metadata,
        "fileType": file.file_type.as_str(),
        "fileCategory": file.file_type.category(),
        "organizationCode": org.map(|o| o.base.code.clone()),
        "organizationName": org.map(|o| o.base.description.clone()),
        "description": file.base.description,
        "tags": file.tags,
        "createdAt": file.base.metadata.created_at.to_rfc3339(),
        "updatedAt": file.base.metadata.updated_at.to_rfc3339(),
        "downloadUrl": format!("/api/v1/production-files/{}/download", file.base.id.value()),
    })
}

/// GET /api/v1/production-files
///
/// Files of the key's organization and of organizations sharing files with it.
pub async fn production_files(
    CurrentApiKey(key): CurrentApiKey,
    Query(query): Query<ProductionFileQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = a010_production_file::service::list_for_partner(&key, &query)
        .await
        .map_err(partner_error)?;
    let organizations: HashMap<String, Organization> = a001_organization::service::list_all()
        .await
        .map_err(internal)?
        .into_iter()
        .map(|o| (o.base.id.value().to_string(), o))
        .collect();

    let data: Vec<serde_json::Value> = page
        .files
        .iter()
        .map(|f| file_json(f, &organizations))
        .collect();
    let permissions: Vec<&String> = key
        .permissions
        .as_object()
        .map(|map| map.iter().filter(|(_, v)| v.as_bool() == Some(true)).map(|(k, _)| k).collect())
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "data": data,
        "pagination": {
            "total": page.total,
            "limit": page.limit,
            "offset": page.offset,
            "hasMore": page.offset + page.limit < page.total,
        },
        "meta": {
            "organization": key.organization_code,
            "permissions": permissions,
            "rateLimitRemaining": crate::system::auth::api_key::remaining_quota(&key),
        },
    })))
}

/// POST /api/v1/production-files
pub async fn upload_production_file(
    CurrentApiKey(key): CurrentApiKey,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let form = read_form(&mut multipart).await.map_err(partner_error)?;
    let file = a010_production_file::service::upload_from_partner(&key, &form)
        .await
        .map_err(partner_error)?;
    tracing::info!(
        "Partner {} uploaded production file {}",
        key.organization_code,
        file.file_name
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "id": file.base.id.value().to_string(),
                "fileName": file.file_name,
                "fileSize": file.file_size,
                "contentType": file.content_type,
                "shipmentNumber": file.bdi_shipment_number,
                "deviceCount": file.device_metadata.device_count,
                "organizationCode": key.organization_code,
                "description": file.base.description,
                "tags": file.tags,
                "createdAt": file.base.metadata.created_at.to_rfc3339(),
                "uploadUrl": format!("/api/v1/production-files/{}", file.base.id.value()),
            },
            "meta": {
                "organization": key.organization_code,
                "uploadedAt": chrono::Utc::now().to_rfc3339(),
                "apiKeyId": key.key_id,
            },
        })),
    ))
}

/// GET /api/v1/production-files/:id/download
pub async fn download_production_file(
    CurrentApiKey(key): CurrentApiKey,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = uuid::Uuid::parse_str(&id)
        .map_err(|_| partner_error(ServiceError::bad_request("Invalid ID")))?;
    let (file, bytes) = a010_production_file::service::download_for_partner(&key, id)
        .await
        .map_err(partner_error)?;
    file_response(&file, bytes).map_err(partner_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_errors_carry_codes() {
        let (status, Json(body)) = partner_error(ServiceError::forbidden(
            "Insufficient permissions. Requires production_files_read permission.",
        ));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");
        assert_eq!(body["success"], false);

        let (status, Json(body)) = partner_error(ServiceError::Internal(anyhow::anyhow!("disk")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
