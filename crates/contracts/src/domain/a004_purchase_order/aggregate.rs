use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseOrderId(pub Uuid);

impl PurchaseOrderId {
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

impl AggregateId for PurchaseOrderId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(PurchaseOrderId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums and lines
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    #[default]
    Draft,
    Sent,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Draft => "draft",
            PurchaseOrderStatus::Sent => "sent",
            PurchaseOrderStatus::Confirmed => "confirmed",
            PurchaseOrderStatus::Shipped => "shipped",
            PurchaseOrderStatus::Delivered => "delivered",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "sent" => PurchaseOrderStatus::Sent,
            "confirmed" => PurchaseOrderStatus::Confirmed,
            "shipped" => PurchaseOrderStatus::Shipped,
            "delivered" => PurchaseOrderStatus::Delivered,
            "cancelled" => PurchaseOrderStatus::Cancelled,
            _ => PurchaseOrderStatus::Draft,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseOrderLine {
    pub sku_id: String,
    pub sku_code: String,
    pub sku_name: Option<String>,
    pub quantity: i32,
    pub unit_cost: f64,
    #[serde(default)]
    pub total_cost: f64,
}

impl PurchaseOrderLine {
    pub fn recalculate(&mut self) {
        self.total_cost = self.quantity as f64 * self.unit_cost;
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Purchase order. `base.code` is the purchase order number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    #[serde(flatten)]
    pub base: BaseAggregate<PurchaseOrderId>,

    pub supplier_name: String,
    pub purchase_order_date: NaiveDate,
    pub requested_delivery_date: Option<NaiveDate>,
    pub status: PurchaseOrderStatus,
    pub terms: String,
    pub incoterms: String,
    pub incoterms_location: Option<String>,
    pub total_value: f64,
    pub notes: Option<String>,
    pub organization_id: Option<String>,
    pub created_by: String,
    pub lines: Vec<PurchaseOrderLine>,
}

impl PurchaseOrder {
    pub fn new_for_insert(
        dto: &PurchaseOrderDto,
        order_date: NaiveDate,
        organization_id: Option<String>,
        created_by: String,
    ) -> Self {
        let number = dto.purchase_order_number.clone().unwrap_or_default();
        let supplier = dto.supplier_name.clone().unwrap_or_default();
        let description = format!("{} / {}", number, supplier);
        let mut base = BaseAggregate::new(PurchaseOrderId::new_v4(), number, description);
        base.comment = dto.comment.clone();

        let mut po = Self {
            base,
            supplier_name: supplier,
            purchase_order_date: order_date,
            requested_delivery_date: dto.requested_delivery_date,
            status: dto.status.unwrap_or_default(),
            terms: dto.terms.clone().unwrap_or_else(|| "NET30".into()),
            incoterms: dto.incoterms.clone().unwrap_or_else(|| "FOB".into()),
            incoterms_location: dto.incoterms_location.clone(),
            total_value: 0.0,
            notes: dto.notes.clone(),
            organization_id,
            created_by,
            lines: dto.lines.clone().unwrap_or_default(),
        };
        po.recalculate_totals();
        po
    }

    pub fn update(&mut self, dto: &PurchaseOrderDto) {
        if let Some(supplier) = &dto.supplier_name {
            self.supplier_name = supplier.clone();
        }
        if let Some(date) = dto.purchase_order_date {
            self.purchase_order_date = date;
        }
        if dto.requested_delivery_date.is_some() {
            self.requested_delivery_date = dto.requested_delivery_date;
        }
        if let Some(status) = dto.status {
            self.status = status;
        }
        if let Some(terms) = &dto.terms {
            self.terms = terms.clone();
        }
        if let Some(incoterms) = &dto.incoterms {
            self.incoterms = incoterms.clone();
        }
        if dto.incoterms_location.is_some() {
            self.incoterms_location = dto.incoterms_location.clone();
        }
        if dto.notes.is_some() {
            self.notes = dto.notes.clone();
        }
        if let Some(lines) = &dto.lines {
            self.lines = lines.clone();
        }
        self.base.description = format!("{} / {}", self.base.code, self.supplier_name);
        self.base.comment = dto.comment.clone();
        self.recalculate_totals();
    }

    /// Line totals are quantity * unit cost; the order total is their sum.
    pub fn recalculate_totals(&mut self) {
        for line in &mut self.lines {
            line.recalculate();
        }
        self.total_value = self.lines.iter().map(|l| l.total_cost).sum();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Purchase order number is required".into());
        }
        if self.supplier_name.trim().is_empty() {
            return Err("Supplier is required".into());
        }
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(format!("Quantity for {} must be positive", line.sku_code));
            }
            if line.unit_cost < 0.0 {
                return Err(format!("Unit cost for {} cannot be negative", line.sku_code));
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.recalculate_totals();
        self.base.touch();
    }

    /// Owner organization or the supplier organization (matched by code) may see the order.
    pub fn is_visible_to(&self, organization_id: &str, organization_code: &str) -> bool {
        self.organization_id.as_deref() == Some(organization_id)
            || self.supplier_name == organization_code
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

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
        "a004"
    }

    fn collection_name() -> &'static str {
        "purchase_order"
    }

    fn element_name() -> &'static str {
        "Purchase order"
    }

    fn list_name() -> &'static str {
        "Purchase orders"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PurchaseOrderDto {
    pub id: Option<String>,
    #[serde(alias = "purchaseOrderNumber")]
    pub purchase_order_number: Option<String>,
    #[serde(alias = "supplierName")]
    pub supplier_name: Option<String>,
    #[serde(alias = "purchaseOrderDate")]
    pub purchase_order_date: Option<NaiveDate>,
    #[serde(alias = "requestedDeliveryDate")]
    pub requested_delivery_date: Option<NaiveDate>,
    pub status: Option<PurchaseOrderStatus>,
    pub terms: Option<String>,
    pub incoterms: Option<String>,
    #[serde(alias = "incotermsLocation")]
    pub incoterms_location: Option<String>,
    pub notes: Option<String>,
    pub lines: Option<Vec<PurchaseOrderLine>>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, quantity: i32, unit_cost: f64) -> PurchaseOrderLine {
        PurchaseOrderLine {
            sku_id: Uuid::new_v4().to_string(),
            sku_code: code.into(),
            sku_name: None,
            quantity,
            unit_cost,
            total_cost: 0.0,
        }
    }

    fn sample() -> PurchaseOrder {
        PurchaseOrder::new_for_insert(
            &PurchaseOrderDto {
                purchase_order_number: Some("PO-2025-001".into()),
                supplier_name: Some("MTN".into()),
                lines: Some(vec![line("A1", 10, 2.5), line("B2", 4, 100.0)]),
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            Some("org-bdi".into()),
            "user-1".into(),
        )
    }

    #[test]
    fn defaults_and_totals() {
        let po = sample();
        assert_eq!(po.terms, "NET30");
        assert_eq!(po.incoterms, "FOB");
        assert_eq!(po.status, PurchaseOrderStatus::Draft);
        assert_eq!(po.lines[0].total_cost, 25.0);
        assert_eq!(po.total_value, 425.0);
        assert!(po.validate().is_ok());
    }

    #[test]
    fn visibility_by_owner_or_supplier_code() {
        let po = sample();
        assert!(po.is_visible_to("org-bdi", "BDI"));
        assert!(po.is_visible_to("org-mtn", "MTN"));
        assert!(!po.is_visible_to("org-olm", "OLM"));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut po = sample();
        po.lines.push(line("C3", 0, 1.0));
        assert!(po.validate().is_err());
    }
}
