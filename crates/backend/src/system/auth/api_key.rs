//! Partner API keys: `bdi_{org}_{64 hex}`, stored as a SHA-256 hash.

use chrono::{DateTime, Utc};
use contracts::system::api_keys::ApiKeyContext;
use once_cell::sync::Lazy;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::domain::a001_organization;
use crate::system::api_keys::repository;
use crate::system::users;

const KEY_PREFIX_LEN: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Invalid Authorization header format. Use: Bearer <api_key> or ApiKey <api_key>")]
    InvalidFormat,
    #[error("Missing API key value")]
    MissingValue,
    #[error("Invalid API key")]
    InvalidKey,
    #[error("API key is inactive")]
    KeyInactive,
    #[error("API key has expired")]
    KeyExpired,
    #[error("User account is inactive")]
    UserInactive,
    #[error("Organization is inactive")]
    OrganizationInactive,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    Internal,
}

pub fn generate_key(organization_code: &str) -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!(
        "bdi_{}_{}",
        organization_code.to_lowercase(),
        hex::encode(bytes)
    )
}

pub fn key_prefix(key: &str) -> String {
    key.chars().take(KEY_PREFIX_LEN).collect()
}

pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Accepts `Bearer <key>` and `ApiKey <key>`
pub fn parse_authorization_header(header: Option<&str>) -> Result<&str, ApiKeyError> {
    let header = header.ok_or(ApiKeyError::MissingHeader)?;
    let value = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("ApiKey "))
        .ok_or(ApiKeyError::InvalidFormat)?
        .trim();
    if value.is_empty() {
        return Err(ApiKeyError::MissingValue);
    }
    Ok(value)
}

fn is_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    expires_at
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc) < now)
        .unwrap_or(false)
}

/// Fixed one-hour windows per key id. A non-positive limit means unlimited.
static USAGE: Lazy<Mutex<HashMap<String, (i64, i32)>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn consume_quota(key_id: &str, limit_per_hour: i32, now: DateTime<Utc>) -> bool {
    if limit_per_hour <= 0 {
        return true;
    }
    let window = now.timestamp() / 3600;
    let Ok(mut usage) = USAGE.lock() else {
        return true;
    };
    let entry = usage.entry(key_id.to_string()).or_insert((window, 0));
    if entry.0 != window {
        *entry = (window, 0);
    }
    if entry.1 >= limit_per_hour {
        return false;
    }
    entry.1 += 1;
    true
}

fn remaining_at(key_id: &str, limit_per_hour: i32, now: DateTime<Utc>) -> Option<i32> {
    if limit_per_hour <= 0 {
        return None;
    }
    let window = now.timestamp() / 3600;
    let used = USAGE
        .lock()
        .ok()
        .and_then(|usage| usage.get(key_id).copied())
        .filter(|(w, _)| *w == window)
        .map(|(_, used)| used)
        .unwrap_or(0);
    Some((limit_per_hour - used).max(0))
}

/// Requests left in the current hour; `None` for unlimited keys
pub fn remaining_quota(key: &ApiKeyContext) -> Option<i32> {
    remaining_at(&key.key_id, key.rate_limit_per_hour, Utc::now())
}

/// Resolves the key in `Authorization` and checks key, owner and organization state.
pub async fn authenticate(header: Option<&str>) -> Result<ApiKeyContext, ApiKeyError> {
    let value = parse_authorization_header(header)?;

    let key = repository::get_by_hash(&hash_key(value))
        .await
        .map_err(|e| {
            tracing::error!("API key lookup failed: {}", e);
            ApiKeyError::Internal
        })?
        .ok_or(ApiKeyError::InvalidKey)?;

    let now = Utc::now();
    if !key.is_active {
        return Err(ApiKeyError::KeyInactive);
    }
    if is_expired(key.expires_at.as_deref(), now) {
        return Err(ApiKeyError::KeyExpired);
    }

    let user = users::repository::get_by_id(&key.user_id)
        .await
        .map_err(|_| ApiKeyError::Internal)?;
    if !user.map(|u| u.is_active).unwrap_or(false) {
        return Err(ApiKeyError::UserInactive);
    }

    let organization = match uuid::Uuid::parse_str(&key.organization_id) {
        Ok(id) => a001_organization::repository::get_by_id(id)
            .await
            .map_err(|_| ApiKeyError::Internal)?,
        Err(_) => None,
    };
    let organization = match organization {
        Some(org) if org.is_active && !org.base.metadata.is_deleted => org,
        _ => return Err(ApiKeyError::OrganizationInactive),
    };

    if !consume_quota(&key.id, key.rate_limit_per_hour, now) {
        return Err(ApiKeyError::RateLimited);
    }

    if let Err(e) = repository::touch_last_used(&key.id).await {
        tracing::warn!("Failed to update API key last used timestamp: {}", e);
    }
    tracing::info!(
        "API key authentication for {} - {}",
        organization.base.code,
        key.key_name
    );

    Ok(ApiKeyContext {
        key_id: key.id,
        user_id: key.user_id,
        organization_id: key.organization_id,
        organization_code: organization.base.code,
        permissions: key.permissions,
        rate_limit_per_hour: key.rate_limit_per_hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_shape() {
        let key = generate_key("MTN");
        assert!(key.starts_with("bdi_mtn_"));
        let secret = key.trim_start_matches("bdi_mtn_");
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key_prefix(&key), "bdi_mtn_".to_string() + &secret[..2]);
        assert_eq!(hash_key(&key).len(), 64);
    }

    #[test]
    fn header_parsing() {
        assert_eq!(
            parse_authorization_header(None),
            Err(ApiKeyError::MissingHeader)
        );
        assert_eq!(
            parse_authorization_header(Some("Basic abc")),
            Err(ApiKeyError::InvalidFormat)
        );
        assert_eq!(
            parse_authorization_header(Some("Bearer  ")),
            Err(ApiKeyError::MissingValue)
        );
        assert_eq!(parse_authorization_header(Some("Bearer bdi_x_1")), Ok("bdi_x_1"));
        assert_eq!(parse_authorization_header(Some("ApiKey bdi_x_2")), Ok("bdi_x_2"));
    }

    #[test]
    fn expiry_check() {
        let now = Utc::now();
        let past = (now - chrono::Duration::days(1)).to_rfc3339();
        let future = (now + chrono::Duration::days(1)).to_rfc3339();
        assert!(is_expired(Some(&past), now));
        assert!(!is_expired(Some(&future), now));
        assert!(!is_expired(None, now));
    }

    #[test]
    fn quota_resets_each_hour() {
        let now = Utc::now();
        assert!(consume_quota("quota-test", 2, now));
        assert!(consume_quota("quota-test", 2, now));
        assert!(!consume_quota("quota-test", 2, now));
        assert!(consume_quota("quota-test", 2, now + chrono::Duration::hours(1)));
    }

    #[test]
    fn non_positive_limit_is_unlimited() {
        let now = Utc::now();
        for _ in 0..5 {
            assert!(consume_quota("quota-unlimited", 0, now));
            assert!(consume_quota("quota-negative", -1, now));
        }
    }

    #[test]
    fn remaining_counts_down_within_the_hour() {
        let now = Utc::now();
        assert_eq!(remaining_at("quota-remaining", 3, now), Some(3));
        assert!(consume_quota("quota-remaining", 3, now));
        assert_eq!(remaining_at("quota-remaining", 3, now), Some(2));
        assert_eq!(remaining_at("quota-remaining", 0, now), None);
    }
}
