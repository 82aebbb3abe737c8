use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductSkuId(pub Uuid);

impl ProductSkuId {
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

impl AggregateId for ProductSkuId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ProductSkuId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// Packaging dimensions. Lengths in centimeters, weights in kilograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingDimensions {
    pub box_length_cm: Option<f64>,
    pub box_width_cm: Option<f64>,
    pub box_height_cm: Option<f64>,
    pub box_weight_kg: Option<f64>,
    pub carton_length_cm: Option<f64>,
    pub carton_width_cm: Option<f64>,
    pub carton_height_cm: Option<f64>,
    pub carton_weight_kg: Option<f64>,
    pub boxes_per_carton: Option<i32>,
}

impl PackagingDimensions {
    /// Carton volume in cubic meters when all three sides are known
    pub fn carton_volume_cbm(&self) -> Option<f64> {
        match (self.carton_length_cm, self.carton_width_cm, self.carton_height_cm) {
            (Some(l), Some(w), Some(h)) => Some(l * w * h / 1_000_000.0),
            _ => None,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Sellable product. `base.code` holds the SKU, `base.description` the product name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSku {
    #[serde(flatten)]
    pub base: BaseAggregate<ProductSkuId>,

    #[serde(rename = "skuCode3Digit")]
    pub sku_code_3_digit: Option<String>,
    pub category: Option<String>,
    pub moq: i32,
    #[serde(rename = "leadTimeDays")]
    pub lead_time_days: i32,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "isDiscontinued")]
    pub is_discontinued: bool,
    #[serde(rename = "htsCode")]
    pub hts_code: Option<String>,
    pub packaging: PackagingDimensions,
}

impl ProductSku {
    pub fn new_for_insert(dto: &ProductSkuDto) -> Self {
        let mut base = BaseAggregate::new(
            ProductSkuId::new_v4(),
            dto.code.trim().to_string(),
            dto.description.clone(),
        );
        base.comment = dto.comment.clone();

        Self {
            base,
            sku_code_3_digit: dto.sku_code_3_digit.clone(),
            category: dto.category.clone(),
            moq: dto.moq.unwrap_or(1),
            lead_time_days: dto.lead_time_days.unwrap_or(30),
            is_active: dto.is_active.unwrap_or(true),
            is_discontinued: dto.is_discontinued.unwrap_or(false),
            hts_code: dto.hts_code.clone(),
            packaging: dto.packaging.clone().unwrap_or_default(),
        }
    }

    pub fn update(&mut self, dto: &ProductSkuDto) {
        self.base.code = dto.code.trim().to_string();
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.sku_code_3_digit = dto.sku_code_3_digit.clone();
        self.category = dto.category.clone();
        if let Some(moq) = dto.moq {
            self.moq = moq;
        }
        if let Some(days) = dto.lead_time_days {
            self.lead_time_days = days;
        }
        if let Some(active) = dto.is_active {
            self.is_active = active;
        }
        if let Some(discontinued) = dto.is_discontinued {
            self.is_discontinued = discontinued;
        }
        self.hts_code = dto.hts_code.clone();
        if let Some(packaging) = &dto.packaging {
            self.packaging = packaging.clone();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.is_empty() {
            return Err("SKU is required".into());
        }
        if self.base.description.trim().is_empty() {
            return Err("Product name is required".into());
        }
        if self.moq < 1 {
            return Err("MOQ must be at least 1".into());
        }
        if self.lead_time_days < 0 {
            return Err("Lead time cannot be negative".into());
        }
        if let Some(code) = &self.sku_code_3_digit {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err("SKU short code must be 3 characters".into());
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for ProductSku {
    type Id = ProductSkuId;

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
        "a002"
    }

    fn collection_name() -> &'static str {
        "product_sku"
    }

    fn element_name() -> &'static str {
        "Product SKU"
    }

    fn list_name() -> &'static str {
        "Product SKUs"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductSkuDto {
    pub id: Option<String>,
    pub code: String,
    pub description: String,
    #[serde(rename = "skuCode3Digit")]
    pub sku_code_3_digit: Option<String>,
    pub category: Option<String>,
    pub moq: Option<i32>,
    #[serde(rename = "leadTimeDays")]
    pub lead_time_days: Option<i32>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "isDiscontinued")]
    pub is_discontinued: Option<bool>,
    #[serde(rename = "htsCode")]
    pub hts_code: Option<String>,
    pub packaging: Option<PackagingDimensions>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_insert() {
        let sku = ProductSku::new_for_insert(&ProductSkuDto {
            code: " MNQ15-30W ".into(),
            description: "Router".into(),
            ..Default::default()
        });
        assert_eq!(sku.base.code, "MNQ15-30W");
        assert_eq!(sku.moq, 1);
        assert_eq!(sku.lead_time_days, 30);
        assert!(sku.validate().is_ok());
    }

    #[test]
    fn carton_volume_needs_all_sides() {
        let mut dims = PackagingDimensions {
            carton_length_cm: Some(50.0),
            carton_width_cm: Some(40.0),
            ..Default::default()
        };
        assert_eq!(dims.carton_volume_cbm(), None);
        dims.carton_height_cm = Some(30.0);
        assert!((dims.carton_volume_cbm().unwrap() - 0.06).abs() < 1e-9);
    }
}
