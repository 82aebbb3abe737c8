use anyhow::{Context, Result};
use contracts::system::users::{OrganizationRole, User, UserRole};
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

use crate::shared::data::db::get_connection;

const USER_COLUMNS: &str = "id, username, email, full_name, phone, role, organization_id, \
     organization_role, preferred_language, is_active, created_at, updated_at, last_login_at, created_by";

fn user_from_row(row: &QueryResult) -> Result<User> {
    let role: String = row.try_get("", "role")?;
    let organization_role: String = row.try_get("", "organization_role")?;
    Ok(User {
        id: row.try_get("", "id")?,
        username: row.try_get("", "username")?,
        email: row.try_get("", "email")?,
        full_name: row.try_get("", "full_name")?,
        phone: row.try_get("", "phone")?,
        role: UserRole::parse(&role).unwrap_or_default(),
        organization_id: row.try_get("", "organization_id")?,
        organization_role: OrganizationRole::parse(&organization_role),
        preferred_language: row.try_get("", "preferred_language")?,
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login_at: row.try_get("", "last_login_at")?,
        created_by: row.try_get("", "created_by")?,
    })
}

async fn query_one_user(filter: &str, value: String) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM sys_users WHERE {} = ?", USER_COLUMNS, filter);
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [value.into()],
        ))
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn create_with_password(user: &User, password_hash: &str) -> Result<()> {
    let sql = format!(
        "INSERT INTO sys_users ({}, password_hash) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        USER_COLUMNS
    );
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [
                user.id.clone().into(),
                user.username.clone().into(),
                user.email.clone().into(),
                user.full_name.clone().into(),
                user.phone.clone().into(),
                user.role.as_str().into(),
                user.organization_id.clone().into(),
                user.organization_role.as_str().into(),
                user.preferred_language.clone().into(),
                i32::from(user.is_active).into(),
                user.created_at.clone().into(),
                user.updated_at.clone().into(),
                user.last_login_at.clone().into(),
                user.created_by.clone().into(),
                password_hash.to_string().into(),
            ],
        ))
        .await
        .context("Failed to insert user")?;
    Ok(())
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    query_one_user("id", id.to_string()).await
}

pub async fn get_by_username(username: &str) -> Result<Option<User>> {
    query_one_user("username", username.to_string()).await
}

pub async fn get_password_hash(user_id: &str) -> Result<Option<String>> {
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("", "password_hash")?)),
        None => Ok(None),
    }
}

pub async fn list_all() -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM sys_users ORDER BY created_at DESC",
        USER_COLUMNS
    );
    let rows = get_connection()
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await?;
    rows.iter().map(user_from_row).collect()
}

/// Members of one organization, ordered by username
pub async fn list_by_organization(organization_id: &str) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM sys_users WHERE organization_id = ? ORDER BY username",
        USER_COLUMNS
    );
    let rows = get_connection()
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [organization_id.into()],
        ))
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn update(user: &User) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users
             SET email = ?, full_name = ?, phone = ?, role = ?, organization_id = ?,
                 organization_role = ?, preferred_language = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
            [
                user.email.clone().into(),
                user.full_name.clone().into(),
                user.phone.clone().into(),
                user.role.as_str().into(),
                user.organization_id.clone().into(),
                user.organization_role.as_str().into(),
                user.preferred_language.clone().into(),
                i32::from(user.is_active).into(),
                user.updated_at.clone().into(),
                user.id.clone().into(),
            ],
        ))
        .await
        .context("Failed to update user")?;
    Ok(())
}

pub async fn update_language(id: &str, language: &str) -> Result<bool> {
    let result = get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users SET preferred_language = ?, updated_at = ? WHERE id = ?",
            [
                language.into(),
                chrono::Utc::now().to_rfc3339().into(),
                id.into(),
            ],
        ))
        .await
        .context("Failed to update language")?;
    Ok(result.rows_affected() > 0)
}

/// Hard delete
pub async fn delete(id: &str) -> Result<bool> {
    let result = get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_users WHERE id = ?",
            [id.into()],
        ))
        .await
        .context("Failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_last_login(id: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users SET last_login_at = ? WHERE id = ?",
            [chrono::Utc::now().to_rfc3339().into(), id.into()],
        ))
        .await
        .context("Failed to update last login")?;
    Ok(())
}

pub async fn count_users() -> Result<usize> {
    let row = get_connection()
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_users".to_string(),
        ))
        .await?;
    match row {
        Some(row) => Ok(row.try_get::<i64>("", "count")? as usize),
        None => Ok(0),
    }
}

pub async fn update_password(id: &str, password_hash: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users SET password_hash = ?, updated_at = ? WHERE id = ?",
            [
                password_hash.into(),
                chrono::Utc::now().to_rfc3339().into(),
                id.into(),
            ],
        ))
        .await
        .context("Failed to update password")?;
    Ok(())
}
