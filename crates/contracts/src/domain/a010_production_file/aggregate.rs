use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionFileId(pub Uuid);

impl ProductionFileId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for ProductionFileId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ProductionFileId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Kind of factory data a file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionFileType {
    #[default]
    ProductionFile,
    #[serde(rename = "ROYALTY_ZONE_1")]
    RoyaltyZone1,
    #[serde(rename = "ROYALTY_ZONE_2")]
    RoyaltyZone2,
    #[serde(rename = "ROYALTY_ZONE_3")]
    RoyaltyZone3,
    #[serde(rename = "ROYALTY_ZONE_4")]
    RoyaltyZone4,
    #[serde(rename = "ROYALTY_ZONE_5")]
    RoyaltyZone5,
    MacAddressList,
    SerialNumberList,
    ProductionReport,
    TestResults,
    CalibrationData,
    FirmwareVersion,
    QualityControl,
    PackagingList,
    Generic,
}

impl ProductionFileType {
    pub const ALL: [ProductionFileType; 15] = [
        ProductionFileType::ProductionFile,
        ProductionFileType::RoyaltyZone1,
        ProductionFileType::RoyaltyZone2,
        ProductionFileType::RoyaltyZone3,
        ProductionFileType::RoyaltyZone4,
        ProductionFileType::RoyaltyZone5,
        ProductionFileType::MacAddressList,
        ProductionFileType::SerialNumberList,
        ProductionFileType::ProductionReport,
        ProductionFileType::TestResults,
        ProductionFileType::CalibrationData,
        ProductionFileType::FirmwareVersion,
        ProductionFileType::QualityControl,
        ProductionFileType::PackagingList,
        ProductionFileType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionFileType::ProductionFile => "PRODUCTION_FILE",
            ProductionFileType::RoyaltyZone1 => "ROYALTY_ZONE_1",
            ProductionFileType::RoyaltyZone2 => "ROYALTY_ZONE_2",
            ProductionFileType::RoyaltyZone3 => "ROYALTY_ZONE_3",
            ProductionFileType::RoyaltyZone4 => "ROYALTY_ZONE_4",
            ProductionFileType::RoyaltyZone5 => "ROYALTY_ZONE_5",
            ProductionFileType::MacAddressList => "MAC_ADDRESS_LIST",
            ProductionFileType::SerialNumberList => "SERIAL_NUMBER_LIST",
            ProductionFileType::ProductionReport => "PRODUCTION_REPORT",
            ProductionFileType::TestResults => "TEST_RESULTS",
            ProductionFileType::CalibrationData => "CALIBRATION_DATA",
            ProductionFileType::FirmwareVersion => "FIRMWARE_VERSION",
            ProductionFileType::QualityControl => "QUALITY_CONTROL",
            ProductionFileType::PackagingList => "PACKAGING_LIST",
            ProductionFileType::Generic => "GENERIC",
        }
    }

    /// Case-insensitive. The legacy lowercase `production` maps to `PRODUCTION_FILE`.
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_uppercase();
        if upper == "PRODUCTION" {
            return Some(ProductionFileType::ProductionFile);
        }
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }

    /// Label shown to partners
    pub fn category(&self) -> String {
        match self {
            ProductionFileType::ProductionFile => "Production Files".to_string(),
            ProductionFileType::RoyaltyZone1 => "Royalty Zone 1 Files".to_string(),
            ProductionFileType::RoyaltyZone2 => "Royalty Zone 2 Files".to_string(),
            ProductionFileType::RoyaltyZone3 => "Royalty Zone 3 Files".to_string(),
            ProductionFileType::RoyaltyZone4 => "Royalty Zone 4 Files".to_string(),
            ProductionFileType::RoyaltyZone5 => "Royalty Zone 5 Files".to_string(),
            ProductionFileType::QualityControl => "Quality Control Files".to_string(),
            ProductionFileType::TestResults => "Testing & Validation Files".to_string(),
            other => other.as_str().to_string(),
        }
    }

    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Devices covered by a production run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceMetadata {
    pub cm_mac_addresses: Vec<String>,
    pub mac_addresses: Vec<String>,
    pub serial_numbers: Vec<String>,
    pub device_count: i64,
    pub production_batch: Option<String>,
    pub manufacturing_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub uploaded_via_api: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
}

/// Factory data file (MAC lists, serials, reports) owned by an organization.
/// `base.code` is `PF-` plus the id prefix, `base.description` the file description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionFile {
    #[serde(flatten)]
    pub base: BaseAggregate<ProductionFileId>,

    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub forecast_id: Option<String>,
    pub bdi_shipment_number: Option<String>,
    pub device_metadata: DeviceMetadata,
    pub file_type: ProductionFileType,
    pub organization_id: String,
    pub uploaded_by: String,
    pub is_public_to_bdi: bool,
    pub tags: Vec<String>,
}

/// Fields of an upload, collected from the multipart form
#[derive(Debug, Clone, Default)]
pub struct ProductionFileUpload {
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub file_type: ProductionFileType,
    pub forecast_id: Option<String>,
    pub bdi_shipment_number: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub device_metadata: DeviceMetadata,
}

impl ProductionFile {
    pub fn new_for_insert(
        upload: &ProductionFileUpload,
        organization_id: String,
        uploaded_by: String,
    ) -> Self {
        let id = ProductionFileId::new_v4();
        let code = format!("PF-{}", &id.as_string()[..8]).to_uppercase();
        let description = upload
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Production file {}", upload.file_name));

        Self {
            base: BaseAggregate::new(id, code, description),
            file_name: upload.file_name.clone(),
            file_path: String::new(),
            file_size: upload.file_size,
            content_type: upload.content_type.clone(),
            forecast_id: upload.forecast_id.clone(),
            bdi_shipment_number: upload.bdi_shipment_number.clone(),
            device_metadata: upload.device_metadata.clone(),
            file_type: upload.file_type,
            organization_id,
            uploaded_by,
            is_public_to_bdi: false,
            tags: upload.tags.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.file_name.trim().is_empty() {
            return Err("File name is required".into());
        }
        if self.file_path.is_empty() {
            return Err("File path is required".into());
        }
        if self.file_size < 0 {
            return Err("File size cannot be negative".into());
        }
        if self.organization_id.is_empty() {
            return Err("Organization is required".into());
        }
        if let Some(tag) = self.tags.iter().find(|t| t.chars().count() > 50) {
            return Err(format!("Tag too long: {}", tag));
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for ProductionFile {
    type Id = ProductionFileId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a010"
    }

    fn collection_name() -> &'static str {
        "production_file"
    }

    fn element_name() -> &'static str {
        "Production File"
    }

    fn list_name() -> &'static str {
        "Production Files"
    }

    fn origin() -> Origin {
        Origin::Partner
    }
}

/// Tags arrive as a JSON array or a comma separated list
pub fn parse_tags(raw: &str) -> Vec<String> {
    let items: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };
    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Query string of GET /api/v1/production-files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionFileQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub organization: Option<String>,
    pub shipment_id: Option<String>,
    pub file_type: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl ProductionFileQuery {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 1000;

    /// (limit, offset); limit defaults to 100 and is capped at 1000
    pub fn page(&self) -> (u64, u64) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_parse_case_insensitively() {
        assert_eq!(
            ProductionFileType::parse("royalty_zone_4"),
            Some(ProductionFileType::RoyaltyZone4)
        );
        assert_eq!(
            ProductionFileType::parse("production"),
            Some(ProductionFileType::ProductionFile)
        );
        assert_eq!(ProductionFileType::parse("spreadsheet"), None);
        let json = serde_json::to_string(&ProductionFileType::RoyaltyZone1).unwrap();
        assert_eq!(json, "\"ROYALTY_ZONE_1\"");
        assert_eq!(ProductionFileType::RoyaltyZone4.category(), "Royalty Zone 4 Files");
        assert_eq!(ProductionFileType::Generic.category(), "GENERIC");
    }

    #[test]
    fn device_metadata_reads_camel_case() {
        let meta: DeviceMetadata = serde_json::from_str(
            r#"{"macAddresses": ["AA:BB:CC:DD:EE:FF"], "serialNumbers": ["SN1"], "deviceCount": 1}"#,
        )
        .unwrap();
        assert_eq!(meta.mac_addresses.len(), 1);
        assert_eq!(meta.serial_numbers, vec!["SN1".to_string()]);
        assert!(meta.cm_mac_addresses.is_empty());
        let out = serde_json::to_value(&meta).unwrap();
        assert!(out.get("uploadedViaApi").is_none());
    }

    #[test]
    fn tags_from_json_or_commas() {
        assert_eq!(parse_tags(r#"["q1", " mtn "]"#), vec!["q1", "mtn"]);
        assert_eq!(parse_tags("q1, mtn,,"), vec!["q1", "mtn"]);
    }

    #[test]
    fn page_is_clamped() {
        let query = ProductionFileQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(query.page(), (1000, 0));
        assert_eq!(ProductionFileQuery::default().page(), (100, 0));
    }

    #[test]
    fn new_file_needs_a_path() {
        let upload = ProductionFileUpload {
            file_name: "mtn_run.csv".into(),
            content_type: "text/csv".into(),
            file_size: 10,
            ..Default::default()
        };
        let mut file = ProductionFile::new_for_insert(&upload, "org-1".into(), "user-1".into());
        assert!(file.base.code.starts_with("PF-"));
        assert_eq!(file.base.description, "Production file mtn_run.csv");
        assert!(file.validate().is_err());
        file.file_path = "production_files/org-1/x_mtn_run.csv".into();
        assert!(file.validate().is_ok());
        assert_eq!(ProductionFile::origin(), Origin::Partner);
    }
}
