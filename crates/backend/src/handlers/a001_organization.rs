use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a001_organization::aggregate::{Organization, OrganizationDto};
use serde_json::json;

use crate::domain::a001_organization;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/organization
///
/// Super admins see every organization, everyone else only their own.
pub async fn list_all(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<Organization>>, StatusCode> {
    let result = if claims.is_super_admin() {
        a001_organization::service::list_all().await
    } else {
        a001_organization::service::of_caller(&claims)
            .await
            .map(|org| org.into_iter().collect())
    };
    result
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/organization/:id
pub async fn get_by_id(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Organization>, StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    if !claims.is_super_admin() && claims.organization_id.as_deref() != Some(id.as_str()) {
        return Err(StatusCode::NOT_FOUND);
    }
    match a001_organization::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/organization
pub async fn upsert(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<OrganizationDto>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if !claims.is_super_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Only super admins can manage organizations"})),
        ));
    }

    let result = if dto.id.is_some() {
        let id = dto.id.clone().unwrap_or_default();
        a001_organization::service::update(dto).await.map(|_| id)
    } else {
        a001_organization::service::create(dto)
            .await
            .map(|id| id.to_string())
    };

    match result {
        Ok(id) => Ok(Json(json!({"id": id}))),
        Err(e) => {
            tracing::warn!("Organization upsert failed: {}", e);
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))))
        }
    }
}

/// DELETE /api/organization/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    if !claims.is_super_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a001_organization::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
