use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use contracts::system::users::User;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::shared::data::db::get_connection;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;
const JWT_SECRET_KEY: &str = "jwt_secret";

/// Builds the claims carried by an access token for `user`
pub fn claims_for(user: &User) -> TokenClaims {
    let now = Utc::now();
    TokenClaims {
        sub: user.id.clone(),
        username: user.username.clone(),
        role: user.role,
        organization_id: user.organization_id.clone(),
        exp: (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    }
}

/// Signs a 24 hour access token for `user`
pub async fn generate_access_token(user: &User) -> Result<String> {
    let secret = get_jwt_secret().await?;
    encode_claims(&claims_for(user), &secret)
}

pub async fn validate_token(token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret().await?;
    decode_claims(token, &secret)
}

fn encode_claims(claims: &TokenClaims, secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

fn decode_claims(token: &str, secret: &str) -> Result<TokenClaims> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;
    Ok(data.claims)
}

/// Opaque refresh token; only its SHA-256 hash is stored
pub fn generate_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Loads the signing secret from `sys_settings`, creating it on first use
pub async fn get_jwt_secret() -> Result<String> {
    match get_jwt_secret_from_db().await {
        Ok(Some(secret)) => Ok(secret),
        Ok(None) | Err(_) => {
            let secret = generate_jwt_secret();
            if let Err(e) = save_jwt_secret_to_db(&secret).await {
                tracing::warn!("Failed to persist generated JWT secret: {}", e);
            }
            Ok(secret)
        }
    }
}

/// 32 random bytes, base64 encoded
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db() -> Result<Option<String>> {
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            [JWT_SECRET_KEY.into()],
        ))
        .await?;

    match row {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

async fn save_jwt_secret_to_db(secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT OR REPLACE INTO sys_settings (key, value, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            [
                JWT_SECRET_KEY.into(),
                secret.to_string().into(),
                "Auto-generated JWT secret for authentication".into(),
                now.clone().into(),
                now.into(),
            ],
        ))
        .await?;
    Ok(())
}

pub fn calculate_refresh_token_expiration() -> String {
    (Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS)).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::users::{OrganizationRole, UserRole};

    fn user() -> User {
        User {
            id: "7d3f0c2e-0000-4000-8000-000000000001".into(),
            username: "planner".into(),
            email: Some("planner@example.com".into()),
            full_name: None,
            phone: None,
            role: UserRole::Sales,
            organization_id: Some("org-1".into()),
            organization_role: OrganizationRole::Member,
            preferred_language: "en".into(),
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
            last_login_at: None,
            created_by: None,
        }
    }

    #[test]
    fn claims_round_trip_through_signed_token() {
        let claims = claims_for(&user());
        let token = encode_claims(&claims, "test-secret").unwrap();
        let decoded = decode_claims(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.role, UserRole::Sales);
        assert_eq!(decoded.organization_id.as_deref(), Some("org-1"));
        assert!(decoded.can_plan());
        assert!(!decoded.is_admin());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_claims(&claims_for(&user()), "one").unwrap();
        assert!(decode_claims(&token, "two").is_err());
    }

    #[test]
    fn generated_secret_is_32_bytes() {
        use base64::{engine::general_purpose, Engine as _};
        let secret = generate_jwt_secret();
        assert_eq!(general_purpose::STANDARD.decode(secret).unwrap().len(), 32);
    }
}
