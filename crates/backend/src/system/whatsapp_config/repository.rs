use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::whatsapp_config::{UpsertWhatsAppConfigDto, WhatsAppConfig};
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

use crate::shared::data::db::get_connection;

const CONFIG_COLUMNS: &str =
    "id, organization_id, account_sid, auth_token, whatsapp_number, is_enabled, updated_at";

fn config_from_row(row: &QueryResult) -> Result<WhatsAppConfig> {
    Ok(WhatsAppConfig {
        id: row.try_get("", "id")?,
        organization_id: row.try_get("", "organization_id")?,
        account_sid: row.try_get("", "account_sid")?,
        auth_token: row.try_get("", "auth_token")?,
        whatsapp_number: row.try_get("", "whatsapp_number")?,
        is_enabled: row.try_get::<i32>("", "is_enabled")? != 0,
        updated_at: row.try_get("", "updated_at")?,
    })
}

/// Stored row for an organization, or the global row when `organization_id` is None
pub async fn get(organization_id: Option<&str>) -> Result<Option<WhatsAppConfig>> {
    let statement = match organization_id {
        Some(org) => Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!(
                "SELECT {} FROM sys_whatsapp_config WHERE organization_id = ?",
                CONFIG_COLUMNS
            ),
            [org.into()],
        ),
        None => Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "SELECT {} FROM sys_whatsapp_config WHERE organization_id IS NULL",
                CONFIG_COLUMNS
            ),
        ),
    };
    let row = get_connection().query_one(statement).await?;
    row.as_ref().map(config_from_row).transpose()
}

/// Enabled organization config, falling back to the enabled global one.
/// Rows without both account SID and auth token do not count.
pub async fn resolve(organization_id: Option<&str>) -> Result<Option<WhatsAppConfig>> {
    let usable = |c: &WhatsAppConfig| {
        c.is_enabled && !c.account_sid.is_empty() && !c.auth_token.is_empty()
    };

    if let Some(org) = organization_id {
        if let Some(config) = get(Some(org)).await?.filter(usable) {
            return Ok(Some(config));
        }
    }
    Ok(get(None).await?.filter(usable))
}

pub async fn upsert(dto: &UpsertWhatsAppConfigDto) -> Result<String> {
    let now = Utc::now().to_rfc3339();
    let existing = get(dto.organization_id.as_deref()).await?;

    match existing {
        Some(config) => {
            get_connection()
                .execute(Statement::from_sql_and_values(
                    DatabaseBackend::Sqlite,
                    "UPDATE sys_whatsapp_config
                     SET account_sid = ?, auth_token = ?, whatsapp_number = ?, is_enabled = ?, updated_at = ?
                     WHERE id = ?",
                    [
                        dto.account_sid.clone().into(),
                        dto.auth_token.clone().into(),
                        dto.whatsapp_number.clone().into(),
                        i32::from(dto.is_enabled).into(),
                        now.into(),
                        config.id.clone().into(),
                    ],
                ))
                .await
                .context("Failed to update WhatsApp config")?;
            Ok(config.id)
        }
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            get_connection()
                .execute(Statement::from_sql_and_values(
                    DatabaseBackend::Sqlite,
                    "INSERT INTO sys_whatsapp_config
                     (id, organization_id, account_sid, auth_token, whatsapp_number, is_enabled, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    [
                        id.clone().into(),
                        dto.organization_id.clone().into(),
                        dto.account_sid.clone().into(),
                        dto.auth_token.clone().into(),
                        dto.whatsapp_number.clone().into(),
                        i32::from(dto.is_enabled).into(),
                        now.clone().into(),
                        now.into(),
                    ],
                ))
                .await
                .context("Failed to insert WhatsApp config")?;
            Ok(id)
        }
    }
}
