use anyhow::{anyhow, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use contracts::system::users::{
    ChangePasswordDto, CreateUserDto, UpdateUserDto, User, SUPPORTED_LANGUAGES,
};

use super::repository;
use crate::system::auth::password;

fn validate_email(email: Option<&str>) -> Result<()> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() && !e.contains('@') => Err(anyhow!("Invalid email format")),
        _ => Ok(()),
    }
}

/// Falls back to English for missing or unsupported codes
pub fn normalize_language(language: Option<&str>) -> String {
    match language {
        Some(code) if SUPPORTED_LANGUAGES.contains(&code) => code.to_string(),
        _ => "en".to_string(),
    }
}

pub async fn create(dto: CreateUserDto, created_by: Option<String>) -> Result<String> {
    if dto.username.trim().is_empty() {
        return Err(anyhow!("Username cannot be empty"));
    }
    if repository::get_by_username(&dto.username).await?.is_some() {
        return Err(anyhow!("Username already exists"));
    }
    validate_email(dto.email.as_deref())?;
    password::validate_password_strength(&dto.password)?;

    let password_hash = password::hash_password(&dto.password)?;
    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: dto.username.trim().to_string(),
        email: dto.email,
        full_name: dto.full_name,
        phone: dto.phone,
        role: dto.role,
        organization_id: dto.organization_id,
        organization_role: dto.organization_role,
        preferred_language: normalize_language(dto.preferred_language.as_deref()),
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
        created_by,
    };

    repository::create_with_password(&user, &password_hash).await?;
    tracing::info!("Created user {} ({})", user.username, user.role.as_str());
    Ok(user.id)
}

pub async fn update(dto: UpdateUserDto) -> Result<()> {
    let mut user = repository::get_by_id(&dto.id)
        .await?
        .ok_or_else(|| anyhow!("User not found"))?;

    validate_email(dto.email.as_deref())?;

    user.email = dto.email;
    user.full_name = dto.full_name;
    user.phone = dto.phone;
    user.role = dto.role;
    user.organization_id = dto.organization_id;
    user.organization_role = dto.organization_role;
    if dto.preferred_language.is_some() {
        user.preferred_language = normalize_language(dto.preferred_language.as_deref());
    }
    user.is_active = dto.is_active;
    user.updated_at = Utc::now().to_rfc3339();

    repository::update(&user).await
}

pub async fn set_language(user_id: &str, language: &str) -> Result<()> {
    if !SUPPORTED_LANGUAGES.contains(&language) {
        return Err(anyhow!(
            "Invalid language code. Supported: {}",
            SUPPORTED_LANGUAGES.join(", ")
        ));
    }
    if !repository::update_language(user_id, language).await? {
        return Err(anyhow!("User not found"));
    }
    Ok(())
}

pub async fn delete(id: &str) -> Result<bool> {
    repository::delete(id).await
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> Result<Vec<User>> {
    repository::list_all().await
}

pub async fn list_by_organization(organization_id: &str) -> Result<Vec<User>> {
    repository::list_by_organization(organization_id).await
}

/// Users change their own password with the old one; a super admin may reset anyone's.
pub async fn change_password(dto: ChangePasswordDto, requester: &TokenClaims) -> Result<()> {
    if repository::get_by_id(&dto.user_id).await?.is_none() {
        return Err(anyhow!("User not found"));
    }

    if dto.user_id != requester.sub {
        if !requester.is_super_admin() {
            return Err(anyhow!("Permission denied"));
        }
    } else {
        let old_password = dto
            .old_password
            .as_deref()
            .ok_or_else(|| anyhow!("Old password is required"))?;
        let current_hash = repository::get_password_hash(&dto.user_id)
            .await?
            .ok_or_else(|| anyhow!("Password hash not found"))?;
        if !password::verify_password(old_password, &current_hash)? {
            return Err(anyhow!("Invalid old password"));
        }
    }

    password::validate_password_strength(&dto.new_password)?;
    let new_hash = password::hash_password(&dto.new_password)?;
    repository::update_password(&dto.user_id, &new_hash).await
}

/// Returns the user when the password matches. Inactive accounts are an error.
pub async fn verify_credentials(username: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = repository::get_by_username(username).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Err(anyhow!("User account is inactive"));
    }

    let password_hash = repository::get_password_hash(&user.id)
        .await?
        .ok_or_else(|| anyhow!("Password hash not found"))?;
    if !password::verify_password(password, &password_hash)? {
        return Ok(None);
    }

    if let Err(e) = repository::update_last_login(&user.id).await {
        tracing::warn!("Failed to record login for {}: {}", user.username, e);
    }
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_falls_back_to_english() {
        assert_eq!(normalize_language(Some("vi")), "vi");
        assert_eq!(normalize_language(Some("fr")), "en");
        assert_eq!(normalize_language(None), "en");
    }

    #[test]
    fn email_check_ignores_blank() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("  ")).is_ok());
        assert!(validate_email(Some("ops@bdi.example")).is_ok());
        assert!(validate_email(Some("nope")).is_err());
    }
}
