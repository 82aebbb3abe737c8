use axum::{extract::Query, http::StatusCode, Json};
use contracts::system::whatsapp_config::{
    SendWhatsAppRequest, UpsertWhatsAppConfigDto, WhatsAppConfig,
};
use serde::Deserialize;
use serde_json::json;

use crate::shared::messaging::whatsapp::{self, WhatsAppError, WhatsAppMessage};
use crate::system::auth::extractor::CurrentUser;
use crate::system::whatsapp_config::repository;

/// Shows the last four characters only
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    pub organization_id: Option<String>,
}

/// GET /api/admin/whatsapp-config
pub async fn get(
    CurrentUser(claims): CurrentUser,
    Query(query): Query<ConfigQuery>,
) -> Result<Json<Option<WhatsAppConfig>>, StatusCode> {
    if !claims.is_super_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    let config = repository::get(query.organization_id.as_deref())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(config.map(|mut c| {
        c.auth_token = mask_token(&c.auth_token);
        c
    })))
}

/// PUT /api/admin/whatsapp-config
pub async fn upsert(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<UpsertWhatsAppConfigDto>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    if !claims.is_super_admin() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Only super admins can configure WhatsApp"})),
        ));
    }
    if dto.account_sid.trim().is_empty() || dto.auth_token.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Account SID and auth token are required"})),
        ));
    }
    let id = repository::upsert(&dto).await.map_err(|e| {
        tracing::error!("Failed to save WhatsApp config: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to save WhatsApp config"})),
        )
    })?;
    Ok(Json(json!({"success": true, "id": id})))
}

/// POST /api/admin/whatsapp-config/test
pub async fn send_test(
    Json(request): Json<SendWhatsAppRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let message = WhatsAppMessage {
        to: whatsapp::format_phone_number(&request.to, "+1"),
        body: request.message,
        media_url: request.media_url,
    };
    match whatsapp::send_message(&message, request.organization_id.as_deref()).await {
        Ok(sent) => Ok(Json(json!({
            "success": true,
            "messageSid": sent.message_sid,
            "status": sent.status,
        }))),
        Err(e) => {
            let status = match e {
                WhatsAppError::NotConfigured | WhatsAppError::InvalidPhoneFormat => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(json!({"success": false, "error": e.to_string(), "code": e.code()})),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_masking_keeps_tail() {
        assert_eq!(mask_token("abcdef123456"), "********3456");
        assert_eq!(mask_token("abc"), "***");
    }
}
