use serde::{Deserialize, Serialize};

/// Stored API key metadata. The plaintext key is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub user_id: String,
    pub organization_id: String,
    pub key_name: String,
    pub key_prefix: String,
    pub permissions: serde_json::Value,
    pub rate_limit_per_hour: i32,
    pub is_active: bool,
    pub expires_at: Option<String>,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApiKeyDto {
    #[serde(alias = "organizationId")]
    pub organization_id: Option<String>,
    #[serde(alias = "keyName")]
    pub key_name: Option<String>,
    pub permissions: Option<serde_json::Value>,
    #[serde(alias = "rateLimitPerHour")]
    pub rate_limit_per_hour: Option<i32>,
    #[serde(alias = "expiresInDays")]
    pub expires_in_days: Option<i64>,
}

/// Returned once on creation; `api_key` is the only copy of the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub api_key: String,
    pub key: ApiKey,
}

/// Context attached to requests authenticated by API key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyContext {
    pub key_id: String,
    pub user_id: String,
    pub organization_id: String,
    pub organization_code: String,
    pub permissions: serde_json::Value,
    pub rate_limit_per_hour: i32,
}

impl ApiKeyContext {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .get(permission)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_must_be_literal_true() {
        let ctx = ApiKeyContext {
            key_id: "k".into(),
            user_id: "u".into(),
            organization_id: "o".into(),
            organization_code: "MTN".into(),
            permissions: serde_json::json!({"read_forecasts": true, "write_forecasts": "yes"}),
            rate_limit_per_hour: 1000,
        };
        assert!(ctx.has_permission("read_forecasts"));
        assert!(!ctx.has_permission("write_forecasts"));
        assert!(!ctx.has_permission("read_invoices"));
    }
}
