use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a009_organization_connection::aggregate::{
    OrganizationConnection, OrganizationConnectionDto,
};
use serde_json::json;

use crate::domain::a009_organization_connection;
use crate::shared::errors::{ServiceError, ServiceResult};
use crate::system::auth::extractor::CurrentUser;

/// GET /api/organization-connections
///
/// Super admins see all connections, others only those involving their organization.
pub async fn list(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<Vec<OrganizationConnection>>, StatusCode> {
    let result = if claims.is_super_admin() {
        a009_organization_connection::service::list_all().await
    } else {
        match &claims.organization_id {
            Some(org) => a009_organization_connection::service::list_for_organization(org).await,
            None => Ok(Vec::new()),
        }
    };
    result
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/organization-connections/:id
pub async fn get_by_id(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<OrganizationConnection>, StatusCode> {
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let connection = a009_organization_connection::service::get_by_id(uuid)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let visible = claims.is_super_admin()
        || claims
            .organization_id
            .as_deref()
            .map(|org| connection.involves(org))
            .unwrap_or(false);
    if !visible {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(connection))
}

/// POST /api/organization-connections (super admin)
pub async fn upsert(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<OrganizationConnectionDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    if !claims.is_super_admin() {
        return Err(ServiceError::forbidden("Only super admins can manage connections"));
    }
    let id = match dto.id.clone() {
        Some(id) => {
            a009_organization_connection::service::update(dto).await?;
            id
        }
        None => a009_organization_connection::service::create(dto)
            .await?
            .to_string(),
    };
    Ok(Json(json!({"id": id})))
}

/// DELETE /api/organization-connections/:id (super admin)
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    if !claims.is_super_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    let uuid = uuid::Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    match a009_organization_connection::service::delete(uuid).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
