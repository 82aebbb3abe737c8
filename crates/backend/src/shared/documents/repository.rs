use anyhow::{Context, Result};
use contracts::system::documents::StoredDocument;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

use crate::shared::data::db::get_connection;

const DOCUMENT_COLUMNS: &str =
    "id, owner_type, owner_id, file_name, file_path, file_type, file_size, uploaded_by, created_at";

fn document_from_row(row: &QueryResult) -> Result<StoredDocument> {
    Ok(StoredDocument {
        id: row.try_get("", "id")?,
        owner_type: row.try_get("", "owner_type")?,
        owner_id: row.try_get("", "owner_id")?,
        file_name: row.try_get("", "file_name")?,
        file_path: row.try_get("", "file_path")?,
        file_type: row.try_get("", "file_type")?,
        file_size: row.try_get("", "file_size")?,
        uploaded_by: row.try_get("", "uploaded_by")?,
        created_at: row.try_get("", "created_at")?,
    })
}

pub async fn insert(doc: &StoredDocument) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO sys_documents (id, owner_type, owner_id, file_name, file_path, file_type,
                 file_size, uploaded_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            [
                doc.id.clone().into(),
                doc.owner_type.clone().into(),
                doc.owner_id.clone().into(),
                doc.file_name.clone().into(),
                doc.file_path.clone().into(),
                doc.file_type.clone().into(),
                doc.file_size.into(),
                doc.uploaded_by.clone().into(),
                doc.created_at.clone().into(),
            ],
        ))
        .await
        .context("Failed to insert document")?;
    Ok(())
}

pub async fn list_by_owner(owner_type: &str, owner_id: &str) -> Result<Vec<StoredDocument>> {
    let sql = format!(
        "SELECT {} FROM sys_documents WHERE owner_type = ? AND owner_id = ? ORDER BY created_at DESC",
        DOCUMENT_COLUMNS
    );
    let rows = get_connection()
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [owner_type.into(), owner_id.into()],
        ))
        .await?;
    rows.iter().map(document_from_row).collect()
}

pub async fn get_by_id(id: &str) -> Result<Option<StoredDocument>> {
    let sql = format!("SELECT {} FROM sys_documents WHERE id = ?", DOCUMENT_COLUMNS);
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &sql,
            [id.into()],
        ))
        .await?;
    row.as_ref().map(document_from_row).transpose()
}

pub async fn delete(id: &str) -> Result<bool> {
    let result = get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_documents WHERE id = ?",
            [id.into()],
        ))
        .await?;
    Ok(result.rows_affected() > 0)
}
