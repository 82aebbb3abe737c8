use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::documents::StoredDocument;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::repository;
use crate::shared::config;

/// Keeps letters, digits, dot, dash and underscore; everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Relative location of an upload inside the storage root
pub fn relative_path(owner_type: &str, owner_id: &str, id: &str, file_name: &str) -> PathBuf {
    PathBuf::from(owner_type)
        .join(owner_id)
        .join(format!("{}_{}", id, sanitize_file_name(file_name)))
}

pub fn check_size(len: usize, max_upload_mb: usize) -> Result<()> {
    if len > max_upload_mb * 1024 * 1024 {
        anyhow::bail!("File too large: {} bytes (limit {} MB)", len, max_upload_mb);
    }
    Ok(())
}

/// Writes bytes under the storage root and returns the stored path with `/` separators
pub async fn write_file(relative: &Path, bytes: &[u8]) -> Result<String> {
    let cfg = config::get();
    check_size(bytes.len(), cfg.storage.max_upload_mb)?;

    let absolute = config::get_storage_root(cfg).join(relative);
    if let Some(parent) = absolute.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&absolute, bytes)
        .await
        .with_context(|| format!("Failed to write {}", absolute.display()))?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

pub async fn read_file(file_path: &str) -> Result<Vec<u8>> {
    let path = config::get_storage_root(config::get()).join(file_path);
    tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Writes the upload to disk and records it in `sys_documents`
pub async fn save(
    owner_type: &str,
    owner_id: &str,
    file_name: &str,
    file_type: &str,
    bytes: &[u8],
    uploaded_by: &str,
) -> Result<StoredDocument> {
    let id = Uuid::new_v4().to_string();
    let relative = relative_path(owner_type, owner_id, &id, file_name);
    let file_path = write_file(&relative, bytes).await?;

    let doc = StoredDocument {
        id,
        owner_type: owner_type.to_string(),
        owner_id: owner_id.to_string(),
        file_name: file_name.to_string(),
        file_path,
        file_type: file_type.to_string(),
        file_size: bytes.len() as i64,
        uploaded_by: uploaded_by.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    repository::insert(&doc).await?;
    tracing::info!(
        "Stored {} for {} {} ({} bytes)",
        doc.file_name,
        owner_type,
        owner_id,
        doc.file_size
    );
    Ok(doc)
}

pub async fn read(doc: &StoredDocument) -> Result<Vec<u8>> {
    read_file(&doc.file_path).await
}

pub async fn remove(doc: &StoredDocument) -> Result<bool> {
    let path = config::get_storage_root(config::get()).join(&doc.file_path);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!("Failed to remove {}: {}", path.display(), e);
    }
    repository::delete(&doc.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("PO 1234 (final).pdf"), "PO_1234__final_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn size_limit_is_in_megabytes() {
        assert!(check_size(1024 * 1024, 1).is_ok());
        assert!(check_size(1024 * 1024 + 1, 1).is_err());
    }

    #[test]
    fn relative_path_is_scoped_by_owner() {
        let path = relative_path("purchase_order", "po-1", "abc", "quote.docx");
        assert_eq!(
            path,
            PathBuf::from("purchase_order").join("po-1").join("abc_quote.docx")
        );
    }
}
