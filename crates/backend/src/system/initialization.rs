use anyhow::Result;
use contracts::system::users::{CreateUserDto, OrganizationRole, UserRole};
use rand::{distributions::Alphanumeric, Rng};

use crate::domain::a001_organization;
use crate::shared::config::env_secret;
use crate::system::users::{repository, service};

const ADMIN_USERNAME: &str = "admin";

/// Random bootstrap password that always passes the strength rules
fn generate_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(14)
        .map(char::from)
        .collect();
    format!("Bdi{}7", body)
}

/// Seeds an empty database: the internal organization and a super admin in it.
///
/// The admin password comes from `BDI_ADMIN_PASSWORD`; without it a random one
/// is generated and logged once.
pub async fn bootstrap() -> Result<()> {
    let internal_id = a001_organization::service::ensure_internal_organization().await?;

    if repository::count_users().await? > 0 {
        return Ok(());
    }

    tracing::info!("No users found. Creating the initial super admin...");
    let (password, generated) = match env_secret("BDI_ADMIN_PASSWORD") {
        Some(p) => (p, false),
        None => (generate_password(), true),
    };

    let admin = CreateUserDto {
        username: ADMIN_USERNAME.to_string(),
        password: password.clone(),
        email: None,
        full_name: Some("Administrator".to_string()),
        phone: None,
        role: UserRole::SuperAdmin,
        organization_id: Some(internal_id.to_string()),
        organization_role: OrganizationRole::Owner,
        preferred_language: None,
    };
    let admin_id = service::create(admin, None).await?;

    tracing::warn!("Initial super admin '{}' created ({})", ADMIN_USERNAME, admin_id);
    if generated {
        tracing::warn!("Generated password: {}. Change it after the first login.", password);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::auth::password::validate_password_strength;

    #[test]
    fn generated_passwords_are_strong_and_unique() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), 18);
        assert!(validate_password_strength(&a).is_ok());
        assert_ne!(a, b);
    }
}
