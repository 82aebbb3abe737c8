use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use contracts::system::users::{
    ChangePasswordDto, CreateUserDto, LanguagePreferenceDto, UpdateUserDto, User, UserRole,
};
use serde_json::json;

use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service;

/// GET /api/system/users
///
/// Super admins see every account; organization admins see their own members.
pub async fn list(CurrentUser(claims): CurrentUser) -> Result<Json<Vec<User>>, StatusCode> {
    let result = if claims.is_super_admin() {
        service::list_all().await
    } else {
        match &claims.organization_id {
            Some(org) => service::list_by_organization(org).await,
            None => Ok(Vec::new()),
        }
    };
    result
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /api/system/users/:id
pub async fn get_by_id(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    let user = service::get_by_id(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !claims.is_super_admin() && user.organization_id != claims.organization_id {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(user))
}

/// POST /api/system/users
pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(mut dto): Json<CreateUserDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    // Organization admins can only add members to their own organization
    if !claims.is_super_admin() {
        dto.organization_id = claims.organization_id.clone();
        if dto.role == UserRole::SuperAdmin {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    let user_id = service::create(dto, Some(claims.sub)).await.map_err(|e| {
        tracing::error!("Failed to create user: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    Ok(Json(json!({ "id": user_id })))
}

/// PUT /api/system/users/:id
pub async fn update(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateUserDto>,
) -> Result<StatusCode, StatusCode> {
    dto.id = id;
    if !claims.is_super_admin() {
        dto.organization_id = claims.organization_id.clone();
        if dto.role == UserRole::SuperAdmin {
            return Err(StatusCode::FORBIDDEN);
        }
    }

    service::update(dto).await.map_err(|e| {
        tracing::error!("Failed to update user: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    Ok(StatusCode::OK)
}

/// DELETE /api/system/users/:id
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    if id == claims.sub {
        return Err(StatusCode::BAD_REQUEST);
    }
    match service::delete(&id).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/system/users/:id/change-password
pub async fn change_password(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> Result<StatusCode, StatusCode> {
    dto.user_id = id;
    service::change_password(dto, &claims).await.map_err(|e| {
        tracing::error!("Failed to change password: {}", e);
        if e.to_string() == "Permission denied" {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::BAD_REQUEST
        }
    })?;
    Ok(StatusCode::OK)
}

/// PUT /api/user/language
pub async fn set_language(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<LanguagePreferenceDto>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    service::set_language(&claims.sub, &dto.preferred_language)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))))?;
    Ok(Json(json!({
        "success": true,
        "preferred_language": dto.preferred_language
    })))
}
