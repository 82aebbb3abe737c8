use serde::{Deserialize, Serialize};

/// Twilio WhatsApp sender settings; `organization_id = None` is the global fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    pub id: String,
    pub organization_id: Option<String>,
    pub account_sid: String,
    /// Masked in API responses
    pub auth_token: String,
    pub whatsapp_number: String,
    pub is_enabled: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertWhatsAppConfigDto {
    pub organization_id: Option<String>,
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendWhatsAppRequest {
    pub to: String,
    pub message: String,
    pub media_url: Option<String>,
    pub organization_id: Option<String>,
}
