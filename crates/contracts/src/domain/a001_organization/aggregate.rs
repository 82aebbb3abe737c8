use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub Uuid);

impl OrganizationId {
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

impl AggregateId for OrganizationId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrganizationId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Role an organization plays in the supply chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
    Internal,
    #[default]
    Contractor,
    ShippingLogistics,
    OemPartner,
    RdPartner,
    Distributor,
    RetailPartner,
    ThreplPartner,
}

impl OrganizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationType::Internal => "internal",
            OrganizationType::Contractor => "contractor",
            OrganizationType::ShippingLogistics => "shipping_logistics",
            OrganizationType::OemPartner => "oem_partner",
            OrganizationType::RdPartner => "rd_partner",
            OrganizationType::Distributor => "distributor",
            OrganizationType::RetailPartner => "retail_partner",
            OrganizationType::ThreplPartner => "threpl_partner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "internal" => Some(OrganizationType::Internal),
            "contractor" => Some(OrganizationType::Contractor),
            "shipping_logistics" => Some(OrganizationType::ShippingLogistics),
            "oem_partner" => Some(OrganizationType::OemPartner),
            "rd_partner" => Some(OrganizationType::RdPartner),
            "distributor" => Some(OrganizationType::Distributor),
            "retail_partner" => Some(OrganizationType::RetailPartner),
            "threpl_partner" => Some(OrganizationType::ThreplPartner),
            _ => None,
        }
    }
}

/// Portal sections visible to members of the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnabledPages {
    pub cpfr_forecasts: bool,
    pub cpfr_shipments: bool,
    pub cpfr_invoices: bool,
    pub cpfr_purchase_orders: bool,
    pub inventory_production_files: bool,
    pub inventory_warehouses: bool,
    pub organization_users: bool,
    pub organization_analytics: bool,
}

impl Default for EnabledPages {
    fn default() -> Self {
        Self {
            cpfr_forecasts: true,
            cpfr_shipments: true,
            cpfr_invoices: true,
            cpfr_purchase_orders: true,
            inventory_production_files: true,
            inventory_warehouses: true,
            organization_users: true,
            organization_analytics: false,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Tenant of the portal. `base.code` is the short organization code (e.g. "BDI", "MTN").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(flatten)]
    pub base: BaseAggregate<OrganizationId>,

    #[serde(rename = "legalName")]
    pub legal_name: Option<String>,
    #[serde(rename = "orgType")]
    pub org_type: OrganizationType,
    #[serde(rename = "poCode2Digit")]
    pub po_code_2_digit: Option<String>,
    #[serde(rename = "contactEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "contactPhone")]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "enabledPages")]
    pub enabled_pages: EnabledPages,
}

impl Organization {
    pub fn new_for_insert(dto: &OrganizationDto) -> Self {
        let mut base = BaseAggregate::new(
            OrganizationId::new_v4(),
            dto.code.trim().to_uppercase(),
            dto.description.clone(),
        );
        base.comment = dto.comment.clone();

        Self {
            base,
            legal_name: dto.legal_name.clone(),
            org_type: dto.org_type,
            po_code_2_digit: dto.po_code_2_digit.clone(),
            contact_email: dto.contact_email.clone(),
            contact_phone: dto.contact_phone.clone(),
            address: dto.address.clone(),
            is_active: dto.is_active.unwrap_or(true),
            enabled_pages: dto.enabled_pages.clone().unwrap_or_default(),
        }
    }

    pub fn update(&mut self, dto: &OrganizationDto) {
        self.base.code = dto.code.trim().to_uppercase();
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.legal_name = dto.legal_name.clone();
        self.org_type = dto.org_type;
        self.po_code_2_digit = dto.po_code_2_digit.clone();
        self.contact_email = dto.contact_email.clone();
        self.contact_phone = dto.contact_phone.clone();
        self.address = dto.address.clone();
        if let Some(active) = dto.is_active {
            self.is_active = active;
        }
        if let Some(pages) = &dto.enabled_pages {
            self.enabled_pages = pages.clone();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Organization name is required".into());
        }
        let code = self.base.code.as_str();
        if code.is_empty() {
            return Err("Organization code is required".into());
        }
        if code.len() > 10
            || !code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(
                "Organization code must be up to 10 uppercase letters, digits or dashes".into(),
            );
        }
        if let Some(po) = &self.po_code_2_digit {
            if po.len() != 2 || !po.chars().all(|c| c.is_ascii_digit()) {
                return Err("PO code must be exactly 2 digits".into());
            }
        }
        if let Some(email) = &self.contact_email {
            if !email.is_empty() && !email.contains('@') {
                return Err("Invalid contact email".into());
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for Organization {
    type Id = OrganizationId;

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
        "a001"
    }

    fn collection_name() -> &'static str {
        "organization"
    }

    fn element_name() -> &'static str {
        "Organization"
    }

    fn list_name() -> &'static str {
        "Organizations"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrganizationDto {
    pub id: Option<String>,
    pub code: String,
    pub description: String,
    #[serde(rename = "legalName")]
    pub legal_name: Option<String>,
    #[serde(rename = "orgType", default)]
    pub org_type: OrganizationType,
    #[serde(rename = "poCode2Digit")]
    pub po_code_2_digit: Option<String>,
    #[serde(rename = "contactEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "contactPhone")]
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "enabledPages")]
    pub enabled_pages: Option<EnabledPages>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(code: &str) -> OrganizationDto {
        OrganizationDto {
            code: code.into(),
            description: "Boundless Devices".into(),
            ..Default::default()
        }
    }

    #[test]
    fn new_organization_gets_default_pages() {
        let org = Organization::new_for_insert(&dto("bdi"));
        assert_eq!(org.base.code, "BDI");
        assert!(org.is_active);
        assert!(org.enabled_pages.cpfr_forecasts);
        assert!(!org.enabled_pages.organization_analytics);
        assert!(org.validate().is_ok());
    }

    #[test]
    fn rejects_bad_code_and_po_code() {
        let org = Organization::new_for_insert(&dto("TOO LONG CODE"));
        assert!(org.validate().is_err());

        let mut org = Organization::new_for_insert(&dto("MTN"));
        org.po_code_2_digit = Some("123".into());
        assert!(org.validate().is_err());
        org.po_code_2_digit = Some("42".into());
        assert!(org.validate().is_ok());
    }

    #[test]
    fn partial_enabled_pages_fill_defaults() {
        let pages: EnabledPages =
            serde_json::from_str(r#"{"organization_analytics": true}"#).unwrap();
        assert!(pages.organization_analytics);
        assert!(pages.cpfr_shipments);
    }
}
