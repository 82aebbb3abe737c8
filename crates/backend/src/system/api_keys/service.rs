use chrono::{Duration, Utc};
use contracts::system::api_keys::{ApiKey, CreateApiKeyDto, CreatedApiKey};
use contracts::system::auth::TokenClaims;
use contracts::system::users::OrganizationRole;
use thiserror::Error;

use super::repository;
use crate::domain::a001_organization;
use crate::system::auth::api_key;
use crate::system::users;

const DEFAULT_RATE_LIMIT_PER_HOUR: i32 = 1000;

#[derive(Debug, Error)]
pub enum CreateApiKeyError {
    #[error("Missing required fields: organization_id, key_name, permissions")]
    MissingFields,
    #[error("Organization not found")]
    OrganizationNotFound,
    #[error("rate_limit_per_hour must be positive")]
    InvalidRateLimit,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn rate_limit(requested: Option<i32>) -> Result<i32, CreateApiKeyError> {
    match requested {
        None => Ok(DEFAULT_RATE_LIMIT_PER_HOUR),
        Some(limit) if limit > 0 => Ok(limit),
        Some(_) => Err(CreateApiKeyError::InvalidRateLimit),
    }
}

/// Issues a new partner key. The plaintext is returned once and never stored.
///
/// The key is owned by an owner/admin of the target organization when one
/// exists, otherwise by the issuing user.
pub async fn create(
    dto: CreateApiKeyDto,
    issuer: &TokenClaims,
) -> Result<CreatedApiKey, CreateApiKeyError> {
    let (Some(organization_id), Some(key_name), Some(permissions)) = (
        dto.organization_id.filter(|s| !s.trim().is_empty()),
        dto.key_name.filter(|s| !s.trim().is_empty()),
        dto.permissions,
    ) else {
        return Err(CreateApiKeyError::MissingFields);
    };

    let rate_limit_per_hour = rate_limit(dto.rate_limit_per_hour)?;

    let org_uuid = uuid::Uuid::parse_str(&organization_id)
        .map_err(|_| CreateApiKeyError::OrganizationNotFound)?;
    let organization = a001_organization::repository::get_by_id(org_uuid)
        .await?
        .ok_or(CreateApiKeyError::OrganizationNotFound)?;

    let owner_id = users::repository::list_by_organization(&organization_id)
        .await?
        .into_iter()
        .find(|u| {
            u.is_active
                && matches!(
                    u.organization_role,
                    OrganizationRole::Owner | OrganizationRole::Admin
                )
        })
        .map(|u| u.id)
        .unwrap_or_else(|| issuer.sub.clone());

    let plaintext = api_key::generate_key(&organization.base.code);
    let now = Utc::now();
    let key = ApiKey {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: owner_id,
        organization_id,
        key_name,
        key_prefix: api_key::key_prefix(&plaintext),
        permissions,
        rate_limit_per_hour,
        is_active: true,
        expires_at: dto
            .expires_in_days
            .map(|days| (now + Duration::days(days)).to_rfc3339()),
        last_used_at: None,
        created_at: now.to_rfc3339(),
    };

    repository::insert(&key, &api_key::hash_key(&plaintext)).await?;
    tracing::info!(
        "Created API key {} for {}",
        key.key_prefix,
        organization.base.code
    );

    Ok(CreatedApiKey {
        api_key: plaintext,
        key,
    })
}

/// Super admins see every key; others only their organization's keys
pub async fn list_for(claims: &TokenClaims) -> anyhow::Result<Vec<ApiKey>> {
    if claims.is_super_admin() {
        return repository::list(None).await;
    }
    match &claims.organization_id {
        Some(org) => repository::list(Some(org)).await,
        None => Ok(Vec::new()),
    }
}

pub async fn deactivate(id: &str) -> anyhow::Result<bool> {
    repository::set_active(id, false).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_defaults_and_rejects_non_positive() {
        assert_eq!(rate_limit(None).unwrap(), 1000);
        assert_eq!(rate_limit(Some(50)).unwrap(), 50);
        assert!(matches!(rate_limit(Some(0)), Err(CreateApiKeyError::InvalidRateLimit)));
        assert!(matches!(rate_limit(Some(-5)), Err(CreateApiKeyError::InvalidRateLimit)));
    }
}
