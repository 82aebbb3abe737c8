use contracts::system::whatsapp_config::WhatsAppConfig;
use maplit::hashmap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::shared::config::env_secret;
use crate::system::whatsapp_config::repository;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

static E164: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").unwrap());

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("WhatsApp is not configured. Please configure it in Admin > Settings.")]
    NotConfigured,

    #[error("Phone number must be in E.164 format (e.g., +1234567890)")]
    InvalidPhoneFormat,

    #[error("Template messages not yet implemented")]
    NotImplemented,

    #[error("Twilio error {code}: {message}")]
    Provider { code: String, message: String },

    #[error("Failed to send WhatsApp message: {0}")]
    Transport(String),
}

impl WhatsAppError {
    pub fn code(&self) -> String {
        match self {
            WhatsAppError::NotConfigured => "NOT_CONFIGURED".into(),
            WhatsAppError::InvalidPhoneFormat => "INVALID_PHONE_FORMAT".into(),
            WhatsAppError::NotImplemented => "NOT_IMPLEMENTED".into(),
            WhatsAppError::Provider { code, .. } => code.clone(),
            WhatsAppError::Transport(_) => "UNKNOWN_ERROR".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatsAppMessage {
    pub to: String,
    pub body: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub message_sid: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    E164.is_match(phone)
}

/// Normalizes a user-entered number to E.164, assuming `default_country_code`
/// for ten-digit numbers.
pub fn format_phone_number(phone: &str, default_country_code: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        return format!("+{}", digits);
    }
    if digits.len() == 10 {
        return format!("{}{}", default_country_code, digits);
    }
    if phone.starts_with('+') {
        return phone.to_string();
    }
    format!("{}{}", default_country_code, digits)
}

fn with_whatsapp_prefix(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{}", number)
    }
}

/// Sender settings from the database, falling back to TWILIO_* variables
pub async fn resolve_config(organization_id: Option<&str>) -> Option<WhatsAppConfig> {
    match repository::resolve(organization_id).await {
        Ok(Some(config)) => return Some(config),
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to load WhatsApp config: {}", e),
    }

    let account_sid = env_secret("TWILIO_ACCOUNT_SID")?;
    let auth_token = env_secret("TWILIO_AUTH_TOKEN")?;
    Some(WhatsAppConfig {
        id: "env".into(),
        organization_id: None,
        account_sid,
        auth_token,
        whatsapp_number: env_secret("TWILIO_WHATSAPP_NUMBER").unwrap_or_default(),
        is_enabled: true,
        updated_at: String::new(),
    })
}

pub async fn is_enabled(organization_id: Option<&str>) -> bool {
    resolve_config(organization_id).await.is_some()
}

pub async fn send_message(
    message: &WhatsAppMessage,
    organization_id: Option<&str>,
) -> Result<SentMessage, WhatsAppError> {
    let config = resolve_config(organization_id)
        .await
        .ok_or(WhatsAppError::NotConfigured)?;

    if !message.to.starts_with('+') && !message.to.starts_with("whatsapp:") {
        return Err(WhatsAppError::InvalidPhoneFormat);
    }

    let to = with_whatsapp_prefix(&message.to);
    let from = with_whatsapp_prefix(&config.whatsapp_number);
    let mut form = hashmap! {
        "From" => from,
        "To" => to,
        "Body" => message.body.clone(),
    };
    if let Some(media) = &message.media_url {
        form.insert("MediaUrl", media.clone());
    }

    let url = format!(
        "{}/Accounts/{}/Messages.json",
        TWILIO_API_BASE, config.account_sid
    );
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| WhatsAppError::Transport(e.to_string()))?;

    let response = client
        .post(&url)
        .basic_auth(&config.account_sid, Some(&config.auth_token))
        .form(&form)
        .send()
        .await
        .map_err(|e| WhatsAppError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<TwilioError> = serde_json::from_str(&body).ok();
        let code = parsed
            .as_ref()
            .and_then(|e| e.code)
            .map(|c| c.to_string())
            .unwrap_or_else(|| status.as_u16().to_string());
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or(body);
        tracing::error!("Twilio rejected WhatsApp message: {} {}", code, message);
        return Err(WhatsAppError::Provider { code, message });
    }

    let sent: TwilioMessage = response
        .json()
        .await
        .map_err(|e| WhatsAppError::Transport(e.to_string()))?;
    tracing::info!("WhatsApp message queued: {}", sent.sid);
    Ok(SentMessage {
        message_sid: sent.sid,
        status: sent.status.unwrap_or_else(|| "queued".into()),
    })
}

pub async fn send_templated_message(
    _to: &str,
    _template: &str,
    _organization_id: Option<&str>,
) -> Result<SentMessage, WhatsAppError> {
    Err(WhatsAppError::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_e164() {
        assert!(is_valid_phone_number("+14155552671"));
        assert!(is_valid_phone_number("+84901234567"));
        assert!(!is_valid_phone_number("4155552671"));
        assert!(!is_valid_phone_number("+0123"));
        assert!(!is_valid_phone_number("+1415555267123456"));
    }

    #[test]
    fn formats_phone_numbers() {
        assert_eq!(format_phone_number("(415) 555-2671", "+1"), "+14155552671");
        assert_eq!(format_phone_number("1-415-555-2671", "+1"), "+14155552671");
        assert_eq!(format_phone_number("+84 90 123 4567", "+1"), "+84 90 123 4567");
        assert_eq!(format_phone_number("0901234", "+84"), "+840901234");
    }

    #[test]
    fn adds_whatsapp_prefix_once() {
        assert_eq!(with_whatsapp_prefix("+14155552671"), "whatsapp:+14155552671");
        assert_eq!(
            with_whatsapp_prefix("whatsapp:+14155552671"),
            "whatsapp:+14155552671"
        );
    }

    #[test]
    fn error_codes() {
        assert_eq!(WhatsAppError::NotConfigured.code(), "NOT_CONFIGURED");
        assert_eq!(WhatsAppError::InvalidPhoneFormat.code(), "INVALID_PHONE_FORMAT");
        assert_eq!(WhatsAppError::NotImplemented.code(), "NOT_IMPLEMENTED");
    }

    #[tokio::test]
    async fn templates_are_not_implemented() {
        let err = send_templated_message("+14155552671", "welcome", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WhatsAppError::NotImplemented));
    }
}
