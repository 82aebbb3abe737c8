use anyhow::{Context, Result};
use contracts::system::api_keys::ApiKey;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

use crate::shared::data::db::get_connection;

const KEY_COLUMNS: &str = "id, user_id, organization_id, key_name, key_prefix, permissions, \
     rate_limit_per_hour, is_active, expires_at, last_used_at, created_at";

fn key_from_row(row: &QueryResult) -> Result<ApiKey> {
    let permissions: String = row.try_get("", "permissions")?;
    Ok(ApiKey {
        id: row.try_get("", "id")?,
        user_id: row.try_get("", "user_id")?,
        organization_id: row.try_get("", "organization_id")?,
        key_name: row.try_get("", "key_name")?,
        key_prefix: row.try_get("", "key_prefix")?,
        permissions: serde_json::from_str(&permissions).unwrap_or_else(|_| serde_json::json!({})),
        rate_limit_per_hour: row.try_get("", "rate_limit_per_hour")?,
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        expires_at: row.try_get("", "expires_at")?,
        last_used_at: row.try_get("", "last_used_at")?,
        created_at: row.try_get("", "created_at")?,
    })
}

pub async fn insert(key: &ApiKey, key_hash: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO sys_api_keys (id, user_id, organization_id, key_name, key_hash, key_prefix,
                 permissions, rate_limit_per_hour, is_active, expires_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            [
                key.id.clone().into(),
                key.user_id.clone().into(),
                key.organization_id.clone().into(),
                key.key_name.clone().into(),
                key_hash.into(),
                key.key_prefix.clone().into(),
                key.permissions.to_string().into(),
                key.rate_limit_per_hour.into(),
                i32::from(key.is_active).into(),
                key.expires_at.clone().into(),
                key.created_at.clone().into(),
                key.created_at.clone().into(),
            ],
        ))
        .await
        .context("Failed to insert API key")?;
    Ok(())
}

pub async fn get_by_hash(key_hash: &str) -> Result<Option<ApiKey>> {
    let sql = format!("SELECT {} FROM sys_api_keys WHERE key_hash = ?", KEY_COLUMNS);
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [key_hash.into()],
        ))
        .await?;
    row.as_ref().map(key_from_row).transpose()
}

/// All keys, or the keys of one organization, oldest first
pub async fn list(organization_id: Option<&str>) -> Result<Vec<ApiKey>> {
    let statement = match organization_id {
        Some(org) => Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM sys_api_keys WHERE organization_id = ? ORDER BY created_at",
                KEY_COLUMNS
            ),
            [org.into()],
        ),
        None => Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_api_keys ORDER BY created_at", KEY_COLUMNS),
        ),
    };
    let rows = get_connection().query_all(statement).await?;
    rows.iter().map(key_from_row).collect()
}

pub async fn set_active(id: &str, is_active: bool) -> Result<bool> {
    let result = get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_api_keys SET is_active = ?, updated_at = ? WHERE id = ?",
            [
                i32::from(is_active).into(),
                chrono::Utc::now().to_rfc3339().into(),
                id.into(),
            ],
        ))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn touch_last_used(id: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_api_keys SET last_used_at = ? WHERE id = ?",
            [chrono::Utc::now().to_rfc3339().into(), id.into()],
        ))
        .await?;
    Ok(())
}
