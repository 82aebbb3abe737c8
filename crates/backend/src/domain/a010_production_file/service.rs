use super::repository::{self, FileFilter};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use contracts::domain::a009_organization_connection::aggregate::{
    ConnectionStatus, OrganizationConnection,
};
use contracts::domain::a010_production_file::aggregate::{
    parse_tags, DeviceMetadata, ProductionFile, ProductionFileQuery, ProductionFileType,
    ProductionFileUpload,
};
use contracts::system::api_keys::ApiKeyContext;
use contracts::system::auth::TokenClaims;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::{a001_organization, a009_organization_connection};
use crate::shared::documents::storage;
use crate::shared::errors::{ServiceError, ServiceResult};

pub const PRODUCTION_FILES_READ: &str = "production_files_read";
pub const PRODUCTION_FILES_UPLOAD: &str = "production_files_upload";
pub const PRODUCTION_FILES_DOWNLOAD: &str = "production_files_download";
pub const ADVANCED_REPORTING: &str = "advanced_reporting";

/// Key permission holding the file types a key may list
const ALLOWED_FILE_TYPES: &str = "allowed_file_types";

/// Content types accepted from partner uploads
pub const PARTNER_CONTENT_TYPES: [&str; 5] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
    "text/plain",
    "application/json",
];

const STORAGE_DIR: &str = "production_files";

static MAC_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([0-9a-f]{2}[:-]){5}[0-9a-f]{2}\b").unwrap());

/// Organizations whose files a caller may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAccess {
    All,
    Organizations(Vec<String>),
}

impl FileAccess {
    pub fn allows(&self, organization_id: &str) -> bool {
        match self {
            FileAccess::All => true,
            FileAccess::Organizations(ids) => ids.iter().any(|id| id == organization_id),
        }
    }

    fn as_filter(&self) -> Option<Vec<String>> {
        match self {
            FileAccess::All => None,
            FileAccess::Organizations(ids) => Some(ids.clone()),
        }
    }
}

fn permission_flag(permissions: &serde_json::Value, key: &str) -> bool {
    permissions.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Active outgoing connection with `canViewFiles` or `canDownloadFiles`
fn connection_shares_files(connection: &OrganizationConnection, source: &str) -> bool {
    connection.source_organization_id == source
        && connection.status == ConnectionStatus::Active
        && (permission_flag(&connection.permissions, "canViewFiles")
            || permission_flag(&connection.permissions, "canDownloadFiles"))
}

/// Own organization, plus every organization with `advanced_reporting`,
/// otherwise the targets of file-sharing connections.
pub fn file_access(key: &ApiKeyContext, connections: &[OrganizationConnection]) -> FileAccess {
    if key.has_permission(ADVANCED_REPORTING) {
        return FileAccess::All;
    }
    let mut ids = vec![key.organization_id.clone()];
    for connection in connections {
        if connection_shares_files(connection, &key.organization_id)
            && !ids.contains(&connection.target_organization_id)
        {
            ids.push(connection.target_organization_id.clone());
        }
    }
    FileAccess::Organizations(ids)
}

/// File types a key is restricted to; empty means no restriction
pub fn allowed_file_types(key: &ApiKeyContext) -> Vec<ProductionFileType> {
    key.permissions
        .get(ALLOWED_FILE_TYPES)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(ProductionFileType::parse)
                .collect()
        })
        .unwrap_or_default()
}

/// Device count and identifiers from a CSV or text export.
/// Columns are picked by header: `serial`, `cm mac` and `mac`.
pub fn scan_devices(text: &str) -> DeviceMetadata {
    let mut meta = DeviceMetadata::default();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|c| c.to_lowercase()).collect(),
        Err(_) => return meta,
    };
    let column = |pred: &dyn Fn(&str) -> bool| headers.iter().position(|h| pred(h.as_str()));
    let serial_col = column(&|h| h.contains("serial"));
    let cm_mac_col = column(&|h| h.contains("mac") && h.contains("cm"));
    let mac_col = column(&|h| h.contains("mac") && !h.contains("cm"));

    for record in reader.records().flatten() {
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        meta.device_count += 1;
        let take = |col: Option<usize>, out: &mut Vec<String>| {
            if let Some(value) = col.and_then(|i| record.get(i)).filter(|v| !v.is_empty()) {
                out.push(value.to_string());
            }
        };
        take(serial_col, &mut meta.serial_numbers);
        take(cm_mac_col, &mut meta.cm_mac_addresses);
        take(mac_col, &mut meta.mac_addresses);
    }

    // Headerless MAC lists
    if mac_col.is_none() && cm_mac_col.is_none() {
        meta.mac_addresses = MAC_ADDRESS
            .find_iter(text)
            .map(|m| m.as_str().to_uppercase().replace('-', ":"))
            .collect();
    }
    meta
}

/// `BDI-{year}-{6 digits}`
pub fn generate_shipment_number(year: i32) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    format!("BDI-{}-{}", year, suffix)
}

/// RFC 3339 timestamp or a plain date (midnight UTC)
fn parse_bound(value: &str, field: &str) -> ServiceResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ServiceError::bad_request(format!("Invalid {}: {}", field, value)))
}

fn ensure_permission(key: &ApiKeyContext, permission: &str) -> ServiceResult<()> {
    if key.has_permission(permission) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(format!(
            "Insufficient permissions. Requires {} permission.",
            permission
        )))
    }
}

async fn access_for(key: &ApiKeyContext) -> ServiceResult<FileAccess> {
    if key.has_permission(ADVANCED_REPORTING) {
        return Ok(FileAccess::All);
    }
    let connections =
        a009_organization_connection::service::list_for_organization(&key.organization_id).await?;
    Ok(file_access(key, &connections))
}

pub struct FilePage {
    pub files: Vec<ProductionFile>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Builds the repository filter for a partner query. Fails before any lookup
/// when the requested file type is unknown.
pub fn partner_filter(
    key: &ApiKeyContext,
    query: &ProductionFileQuery,
    access: &FileAccess,
) -> ServiceResult<FileFilter> {
    let mut filter = FileFilter {
        organization_ids: access.as_filter(),
        file_types: allowed_file_types(key),
        shipment_number: query.shipment_id.clone().filter(|s| !s.is_empty()),
        ..Default::default()
    };
    if let Some(raw) = query.file_type.as_deref().filter(|s| !s.is_empty()) {
        let requested = ProductionFileType::parse(raw).ok_or_else(|| {
            ServiceError::bad_request(format!(
                "Invalid file_type. Valid types: {}",
                ProductionFileType::valid_list()
            ))
        })?;
        if !filter.file_types.is_empty() && !filter.file_types.contains(&requested) {
            filter.file_types.clear();
            filter.organization_ids = Some(Vec::new());
        } else {
            filter.file_types = vec![requested];
        }
    }
    if let Some(from) = query.from_date.as_deref().filter(|s| !s.is_empty()) {
        filter.created_from = Some(parse_bound(from, "from_date")?);
    }
    if let Some(to) = query.to_date.as_deref().filter(|s| !s.is_empty()) {
        filter.created_to = Some(parse_bound(to, "to_date")?);
    }
    Ok(filter)
}

/// Files the key's organization may see, newest first
pub async fn list_for_partner(
    key: &ApiKeyContext,
    query: &ProductionFileQuery,
) -> ServiceResult<FilePage> {
    ensure_permission(key, PRODUCTION_FILES_READ)?;
    let access = access_for(key).await?;
    let mut filter = partner_filter(key, query, &access)?;

    if let Some(code) = query.organization.as_deref().filter(|s| !s.is_empty()) {
        if let Some(org) = a001_organization::service::get_by_code(code).await? {
            filter.organization_id = Some(org.base.id.value().to_string());
        }
    }

    let (limit, offset) = query.page();
    let (files, total) = repository::search(&filter, limit, offset).await?;
    tracing::info!(
        "Partner {} listed {} of {} production files",
        key.organization_code,
        files.len(),
        total
    );
    Ok(FilePage {
        files,
        total,
        limit,
        offset,
    })
}

/// Stored file and its bytes, if the key's organization may see it
pub async fn download_for_partner(
    key: &ApiKeyContext,
    id: Uuid,
) -> ServiceResult<(ProductionFile, Vec<u8>)> {
    ensure_permission(key, PRODUCTION_FILES_DOWNLOAD)?;
    let file = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("File not found"))?;
    if !access_for(key).await?.allows(&file.organization_id) {
        return Err(ServiceError::forbidden(
            "Access denied. You do not have permission to download this file.",
        ));
    }
    let bytes = storage::read_file(&file.file_path).await?;
    tracing::info!(
        "Partner {} downloaded {}",
        key.organization_code,
        file.file_name
    );
    Ok((file, bytes))
}

/// Multipart form fields besides the file itself
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub file_type: Option<String>,
    pub shipment_number: Option<String>,
    pub forecast_id: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub device_metadata: Option<String>,
    pub device_type: Option<String>,
    pub manufacturing_date: Option<String>,
}

fn is_text(content_type: &str) -> bool {
    content_type == "text/csv" || content_type == "text/plain"
}

/// Upload details for a partner upload. Text files are scanned for devices.
pub fn partner_upload(key: &ApiKeyContext, form: &UploadForm) -> ServiceResult<ProductionFileUpload> {
    if !PARTNER_CONTENT_TYPES.contains(&form.content_type.as_str()) {
        return Err(ServiceError::bad_request(
            "Invalid file type. Allowed types: Excel (.xlsx, .xls), CSV (.csv), Text (.txt), JSON (.json)",
        ));
    }
    let mut device_metadata = if is_text(&form.content_type) {
        scan_devices(&String::from_utf8_lossy(&form.bytes))
    } else {
        DeviceMetadata::default()
    };
    device_metadata.device_type = Some(
        form.device_type
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    device_metadata.manufacturing_date = Some(
        form.manufacturing_date
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Utc::now().to_rfc3339()),
    );
    device_metadata.uploaded_via_api = true;
    device_metadata.api_key_id = Some(key.key_id.clone());

    let shipment_number = form
        .shipment_number
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate_shipment_number(Utc::now().year()));
    let description = form.description.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| {
        format!(
            "Production file uploaded via API by {}",
            key.organization_code
        )
    });

    Ok(ProductionFileUpload {
        file_name: form.file_name.clone(),
        content_type: form.content_type.clone(),
        file_size: form.bytes.len() as i64,
        file_type: ProductionFileType::ProductionFile,
        forecast_id: None,
        bdi_shipment_number: Some(shipment_number),
        description: Some(description),
        tags: form
            .tags
            .as_deref()
            .map(parse_tags)
            .unwrap_or_default(),
        device_metadata,
    })
}

/// Upload details for a portal user. Device metadata comes from the form as JSON.
pub fn portal_upload(form: &UploadForm) -> ServiceResult<ProductionFileUpload> {
    let file_type = match form.file_type.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => ProductionFileType::parse(raw).ok_or_else(|| {
            ServiceError::bad_request(format!(
                "Invalid fileType. Valid types: {}",
                ProductionFileType::valid_list()
            ))
        })?,
        None => ProductionFileType::ProductionFile,
    };
    let device_metadata = match form.device_metadata.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed device metadata: {}", e);
            DeviceMetadata::default()
        }),
        None if is_text(&form.content_type) => scan_devices(&String::from_utf8_lossy(&form.bytes)),
        None => DeviceMetadata::default(),
    };
    Ok(ProductionFileUpload {
        file_name: form.file_name.clone(),
        content_type: form.content_type.clone(),
        file_size: form.bytes.len() as i64,
        file_type,
        forecast_id: form.forecast_id.clone().filter(|s| !s.is_empty()),
        bdi_shipment_number: form.shipment_number.clone().filter(|s| !s.is_empty()),
        description: form.description.clone(),
        tags: form
            .tags
            .as_deref()
            .map(parse_tags)
            .unwrap_or_default(),
        device_metadata,
    })
}

/// Writes the bytes, then records the file
async fn store(
    upload: &ProductionFileUpload,
    bytes: &[u8],
    organization_id: &str,
    uploaded_by: &str,
) -> ServiceResult<ProductionFile> {
    let mut aggregate =
        ProductionFile::new_for_insert(upload, organization_id.to_string(), uploaded_by.to_string());
    let relative = storage::relative_path(
        STORAGE_DIR,
        organization_id,
        &aggregate.base.id.value().to_string(),
        &upload.file_name,
    );
    aggregate.file_path = relative.to_string_lossy().replace('\\', "/");
    aggregate
        .validate()
        .map_err(|e| ServiceError::bad_request(format!("Validation failed: {}", e)))?;

    storage::check_size(bytes.len(), crate::shared::config::get().storage.max_upload_mb)
        .map_err(|e| ServiceError::bad_request(e.to_string()))?;
    storage::write_file(&PathBuf::from(&aggregate.file_path), bytes).await?;

    aggregate.before_write();
    repository::insert(&aggregate).await?;
    tracing::info!(
        "Stored production file {} for organization {} ({} devices)",
        aggregate.file_name,
        organization_id,
        aggregate.device_metadata.device_count
    );
    Ok(aggregate)
}

pub async fn upload_from_partner(
    key: &ApiKeyContext,
    form: &UploadForm,
) -> ServiceResult<ProductionFile> {
    ensure_permission(key, PRODUCTION_FILES_UPLOAD)?;
    let upload = partner_upload(key, form)?;
    store(&upload, &form.bytes, &key.organization_id, &key.user_id).await
}

/// Internal organization and super admins see every file
async fn sees_everything(claims: &TokenClaims) -> ServiceResult<bool> {
    if claims.is_super_admin() {
        return Ok(true);
    }
    let org = a001_organization::service::of_caller(claims).await?;
    Ok(org
        .map(|o| o.base.code == a001_organization::service::INTERNAL_CODE)
        .unwrap_or(false))
}

pub async fn list_for_user(claims: &TokenClaims) -> ServiceResult<Vec<ProductionFile>> {
    if sees_everything(claims).await? {
        return Ok(repository::list_all().await?);
    }
    match &claims.organization_id {
        Some(org) => Ok(repository::list_visible_to(org).await?),
        None => Ok(Vec::new()),
    }
}

pub async fn upload_for_user(
    claims: &TokenClaims,
    form: &UploadForm,
) -> ServiceResult<ProductionFile> {
    let organization_id = claims
        .organization_id
        .clone()
        .ok_or_else(|| ServiceError::not_found("User organization not found"))?;
    let upload = portal_upload(form)?;
    store(&upload, &form.bytes, &organization_id, &claims.sub).await
}

pub async fn download_for_user(
    claims: &TokenClaims,
    id: Uuid,
) -> ServiceResult<(ProductionFile, Vec<u8>)> {
    let file = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("File not found"))?;
    let visible = file.is_public_to_bdi
        || claims.organization_id.as_deref() == Some(file.organization_id.as_str())
        || sees_everything(claims).await?;
    if !visible {
        return Err(ServiceError::not_found("File not found"));
    }
    let bytes = storage::read_file(&file.file_path).await?;
    Ok((file, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a009_organization_connection::aggregate::OrganizationConnectionDto;
    use serde_json::json;

    fn key(permissions: serde_json::Value) -> ApiKeyContext {
        ApiKeyContext {
            key_id: "key-1".into(),
            user_id: "user-1".into(),
            organization_id: "org-mtn".into(),
            organization_code: "MTN".into(),
            permissions,
            rate_limit_per_hour: 1000,
        }
    }

    fn connection(target: &str, permissions: serde_json::Value) -> OrganizationConnection {
        OrganizationConnection::new_for_insert(&OrganizationConnectionDto {
            source_organization_id: "org-mtn".into(),
            target_organization_id: target.into(),
            permissions: Some(permissions),
            ..Default::default()
        })
    }

    #[test]
    fn connections_grant_file_access() {
        let mut suspended = connection("org-suspended", json!({"canViewFiles": true}));
        suspended.status = ConnectionStatus::Suspended;
        let connections = vec![
            connection("org-view", json!({"canViewFiles": true})),
            connection("org-download", json!({"canDownloadFiles": true})),
            connection("org-messages", json!({"canSendMessages": true})),
            suspended,
        ];
        let access = file_access(&key(json!({"production_files_read": true})), &connections);
        assert!(access.allows("org-mtn"));
        assert!(access.allows("org-view"));
        assert!(access.allows("org-download"));
        assert!(!access.allows("org-messages"));
        assert!(!access.allows("org-suspended"));
    }

    #[test]
    fn incoming_connections_do_not_grant_access() {
        let incoming = OrganizationConnection::new_for_insert(&OrganizationConnectionDto {
            source_organization_id: "org-gpn".into(),
            target_organization_id: "org-mtn".into(),
            permissions: Some(json!({"canViewFiles": true})),
            ..Default::default()
        });
        let access = file_access(&key(json!({})), &[incoming]);
        assert_eq!(access, FileAccess::Organizations(vec!["org-mtn".into()]));
    }

    #[test]
    fn advanced_reporting_sees_everything() {
        let access = file_access(&key(json!({"advanced_reporting": true})), &[]);
        assert_eq!(access, FileAccess::All);
        assert!(access.allows("any-org"));
    }

    #[test]
    fn key_file_type_restrictions_apply() {
        let restricted = key(json!({
            "production_files_read": true,
            "allowed_file_types": ["MAC_ADDRESS_LIST", "bogus"]
        }));
        assert_eq!(
            allowed_file_types(&restricted),
            vec![ProductionFileType::MacAddressList]
        );
        let access = FileAccess::Organizations(vec!["org-mtn".into()]);

        let query = ProductionFileQuery {
            file_type: Some("royalty_zone_4".into()),
            ..Default::default()
        };
        let filter = partner_filter(&restricted, &query, &access).unwrap();
        assert_eq!(filter.organization_ids, Some(Vec::new()));

        let query = ProductionFileQuery {
            file_type: Some("mac_address_list".into()),
            from_date: Some("2025-01-15".into()),
            ..Default::default()
        };
        let filter = partner_filter(&restricted, &query, &access).unwrap();
        assert_eq!(filter.file_types, vec![ProductionFileType::MacAddressList]);
        assert_eq!(
            filter.created_from.map(|d| d.to_rfc3339()),
            Some("2025-01-15T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn unknown_file_type_is_rejected() {
        let query = ProductionFileQuery {
            file_type: Some("spreadsheet".into()),
            ..Default::default()
        };
        let result = partner_filter(&key(json!({})), &query, &FileAccess::All);
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn scans_devices_from_csv() {
        let csv = "Serial Number,MAC Address,CM MAC\nSN001,AA:BB:CC:00:00:01,AA:BB:CC:10:00:01\nSN002,AA:BB:CC:00:00:02,\n\n";
        let meta = scan_devices(csv);
        assert_eq!(meta.device_count, 2);
        assert_eq!(meta.serial_numbers, vec!["SN001", "SN002"]);
        assert_eq!(meta.mac_addresses.len(), 2);
        assert_eq!(meta.cm_mac_addresses, vec!["AA:BB:CC:10:00:01"]);
    }

    #[test]
    fn scans_headerless_mac_lists() {
        let meta = scan_devices("devices\naa-bb-cc-00-00-01\naa:bb:cc:00:00:02\n");
        assert_eq!(meta.device_count, 2);
        assert_eq!(
            meta.mac_addresses,
            vec!["AA:BB:CC:00:00:01", "AA:BB:CC:00:00:02"]
        );
    }

    #[test]
    fn partner_upload_records_api_metadata() {
        let form = UploadForm {
            file_name: "run.csv".into(),
            content_type: "text/csv".into(),
            bytes: b"serial\nSN1\nSN2\n".to_vec(),
            tags: Some("q1, mtn".into()),
            ..Default::default()
        };
        let upload = partner_upload(&key(json!({})), &form).unwrap();
        assert_eq!(upload.device_metadata.device_count, 2);
        assert!(upload.device_metadata.uploaded_via_api);
        assert_eq!(upload.device_metadata.api_key_id.as_deref(), Some("key-1"));
        assert_eq!(upload.device_metadata.device_type.as_deref(), Some("Unknown"));
        assert_eq!(upload.tags, vec!["q1", "mtn"]);
        assert_eq!(
            upload.description.as_deref(),
            Some("Production file uploaded via API by MTN")
        );
        let number = upload.bdi_shipment_number.unwrap();
        assert!(number.starts_with("BDI-"));
        assert_eq!(number.len(), "BDI-2025-123456".len());
    }

    #[test]
    fn partner_upload_rejects_binary_types() {
        let form = UploadForm {
            file_name: "photo.png".into(),
            content_type: "image/png".into(),
            ..Default::default()
        };
        assert!(matches!(
            partner_upload(&key(json!({})), &form),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn portal_upload_takes_device_metadata_json() {
        let form = UploadForm {
            file_name: "macs.xlsx".into(),
            content_type: PARTNER_CONTENT_TYPES[0].into(),
            file_type: Some("MAC_ADDRESS_LIST".into()),
            device_metadata: Some(r#"{"macAddresses": ["AA:BB:CC:DD:EE:FF"], "deviceCount": 1}"#.into()),
            ..Default::default()
        };
        let upload = portal_upload(&form).unwrap();
        assert_eq!(upload.file_type, ProductionFileType::MacAddressList);
        assert_eq!(upload.device_metadata.device_count, 1);
        assert!(!upload.device_metadata.uploaded_via_api);
    }

    #[tokio::test]
    async fn partner_calls_need_file_permissions() {
        let no_rights = key(json!({"read_forecasts": true}));
        assert!(matches!(
            list_for_partner(&no_rights, &ProductionFileQuery::default()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            upload_from_partner(&no_rights, &UploadForm::default()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            download_for_partner(&no_rights, Uuid::new_v4()).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
