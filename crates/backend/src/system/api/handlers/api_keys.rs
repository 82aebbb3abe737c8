use axum::{extract::Path, http::StatusCode, Json};
use contracts::system::api_keys::{ApiKey, CreateApiKeyDto, CreatedApiKey};
use serde_json::json;

use crate::system::api_keys::service::{self, CreateApiKeyError};
use crate::system::auth::extractor::CurrentUser;

/// GET /api/system/api-keys
pub async fn list(CurrentUser(claims): CurrentUser) -> Result<Json<Vec<ApiKey>>, StatusCode> {
    service::list_for(&claims)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/system/api-keys
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<CreateApiKeyDto>,
) -> Result<(StatusCode, Json<CreatedApiKey>), (StatusCode, Json<serde_json::Value>)> {
    if !claims.is_super_admin()
        && dto.organization_id.is_some()
        && dto.organization_id != claims.organization_id
    {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Cannot issue keys for another organization"})),
        ));
    }

    match service::create(dto, &claims).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            let status = match e {
                CreateApiKeyError::MissingFields | CreateApiKeyError::InvalidRateLimit => {
                    StatusCode::BAD_REQUEST
                }
                CreateApiKeyError::OrganizationNotFound => StatusCode::NOT_FOUND,
                CreateApiKeyError::Internal(ref err) => {
                    tracing::error!("Failed to create API key: {}", err);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            Err((status, Json(json!({"error": e.to_string()}))))
        }
    }
}

/// DELETE /api/system/api-keys/:id
pub async fn deactivate(Path(id): Path<String>) -> Result<StatusCode, StatusCode> {
    match service::deactivate(&id).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
