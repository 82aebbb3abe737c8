use serde::{Deserialize, Serialize};

/// File attached to a purchase order or invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    /// "purchase_order" or "invoice"
    pub owner_type: String,
    pub owner_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: String,
    pub created_at: String,
}

/// Line item pulled from a vendor quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLineItem {
    pub line_number: Option<u32>,
    pub description: String,
    pub category: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_amount: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorInfo {
    pub name: Option<String>,
    pub quote_number: Option<String>,
    pub quote_date: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub text: String,
    pub line_items: Vec<ExtractedLineItem>,
    pub vendor_info: VendorInfo,
    pub page_count: u32,
    pub metadata: serde_json::Value,
}

/// Row shape ready for the NRE budget line-item table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NreLineItemRow {
    pub line_item_number: u32,
    pub description: String,
    pub category: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub total_amount: f64,
    pub currency: String,
    pub status: String,
    pub confidence_score: f64,
    pub extracted_data: serde_json::Value,
    pub created_by: String,
}
