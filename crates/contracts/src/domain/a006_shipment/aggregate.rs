use crate::domain::a003_sales_forecast::aggregate::MilestoneSignals;
use crate::domain::common::{
    append_milestone_note, AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Milestone,
    Origin, SignalStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipmentId(pub Uuid);

impl ShipmentId {
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

impl AggregateId for ShipmentId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ShipmentId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentPriority {
    #[default]
    Standard,
    Expedited,
    Urgent,
}

impl ShipmentPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentPriority::Standard => "standard",
            ShipmentPriority::Expedited => "expedited",
            ShipmentPriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "expedited" => ShipmentPriority::Expedited,
            "urgent" => ShipmentPriority::Urgent,
            _ => ShipmentPriority::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::Confirmed => "confirmed",
            ShipmentStatus::Shipped => "shipped",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "confirmed" => ShipmentStatus::Confirmed,
            "shipped" => ShipmentStatus::Shipped,
            "delivered" => ShipmentStatus::Delivered,
            "cancelled" => ShipmentStatus::Cancelled,
            _ => ShipmentStatus::Pending,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Physical movement of forecast quantity from factory through a shipper to a destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(flatten)]
    pub base: BaseAggregate<ShipmentId>,

    pub forecast_id: Option<String>,
    pub shipper_organization_id: Option<String>,
    pub shipping_organization_code: Option<String>,
    pub requested_quantity: i32,
    pub units_per_carton: i32,
    pub priority: ShipmentPriority,
    pub incoterms: String,
    pub shipper_reference: Option<String>,
    pub estimated_ship_date: Option<NaiveDate>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub actual_ship_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,
    pub status: ShipmentStatus,
    pub signals: MilestoneSignals,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub calculated_data: serde_json::Value,
    pub created_by: String,
}

impl Shipment {
    pub fn new_for_insert(dto: &ShipmentDto, created_by: String) -> Self {
        let id = ShipmentId::new_v4();
        let code = dto
            .bdi_reference
            .clone()
            .unwrap_or_else(|| format!("SHP-{}", &id.as_string()[..8]).to_uppercase());
        let description = format!("{} x{}", code, dto.requested_quantity.unwrap_or_default());
        let mut base = BaseAggregate::new(id, code, description);
        base.comment = dto.comment.clone();

        Self {
            base,
            forecast_id: dto.forecast_id.clone(),
            shipper_organization_id: dto.shipper_organization_id.clone(),
            shipping_organization_code: dto.shipping_organization_code.clone(),
            requested_quantity: dto.requested_quantity.unwrap_or_default(),
            units_per_carton: dto.units_per_carton.unwrap_or(5),
            priority: dto.priority.unwrap_or_default(),
            incoterms: dto.incoterms.clone().unwrap_or_else(|| "EXW".into()),
            shipper_reference: dto.shipper_reference.clone(),
            estimated_ship_date: dto.estimated_ship_date,
            estimated_delivery_date: dto.estimated_delivery_date,
            actual_ship_date: None,
            actual_delivery_date: None,
            status: dto.status.unwrap_or_default(),
            signals: MilestoneSignals::default(),
            pickup_location: dto.pickup_location.clone(),
            delivery_location: dto.delivery_location.clone(),
            notes: dto.notes.clone(),
            special_instructions: dto.special_instructions.clone(),
            calculated_data: dto
                .calculated_data
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            created_by,
        }
    }

    pub fn update(&mut self, dto: &ShipmentDto) {
        if dto.shipper_organization_id.is_some() {
            self.shipper_organization_id = dto.shipper_organization_id.clone();
        }
        if dto.shipping_organization_code.is_some() {
            self.shipping_organization_code = dto.shipping_organization_code.clone();
        }
        if let Some(quantity) = dto.requested_quantity {
            self.requested_quantity = quantity;
        }
        if let Some(units) = dto.units_per_carton {
            self.units_per_carton = units;
        }
        if let Some(priority) = dto.priority {
            self.priority = priority;
        }
        if let Some(incoterms) = &dto.incoterms {
            self.incoterms = incoterms.clone();
        }
        if dto.shipper_reference.is_some() {
            self.shipper_reference = dto.shipper_reference.clone();
        }
        if dto.estimated_ship_date.is_some() {
            self.estimated_ship_date = dto.estimated_ship_date;
        }
        if dto.estimated_delivery_date.is_some() {
            self.estimated_delivery_date = dto.estimated_delivery_date;
        }
        if dto.actual_ship_date.is_some() {
            self.actual_ship_date = dto.actual_ship_date;
        }
        if dto.actual_delivery_date.is_some() {
            self.actual_delivery_date = dto.actual_delivery_date;
        }
        if let Some(status) = dto.status {
            self.status = status;
        }
        if dto.pickup_location.is_some() {
            self.pickup_location = dto.pickup_location.clone();
        }
        if dto.delivery_location.is_some() {
            self.delivery_location = dto.delivery_location.clone();
        }
        if dto.notes.is_some() {
            self.notes = dto.notes.clone();
        }
        if dto.special_instructions.is_some() {
            self.special_instructions = dto.special_instructions.clone();
        }
        if let Some(data) = &dto.calculated_data {
            self.calculated_data = data.clone();
        }
        self.base.comment = dto.comment.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.requested_quantity <= 0 {
            return Err("Requested quantity must be positive".into());
        }
        if self.units_per_carton <= 0 {
            return Err("Units per carton must be positive".into());
        }
        if let (Some(ship), Some(delivery)) = (self.estimated_ship_date, self.estimated_delivery_date)
        {
            if delivery < ship {
                return Err("Delivery date cannot precede ship date".into());
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }

    /// Number of cartons needed for the requested quantity, rounded up
    pub fn carton_count(&self) -> i32 {
        if self.units_per_carton <= 0 {
            return 0;
        }
        (self.requested_quantity + self.units_per_carton - 1) / self.units_per_carton
    }

    pub fn apply_status(
        &mut self,
        milestone: Milestone,
        status: SignalStatus,
        notes: Option<&str>,
        today: NaiveDate,
    ) {
        self.signals.set(milestone, status);
        if let Some(text) = notes.filter(|n| !n.is_empty()) {
            self.notes = Some(append_milestone_note(
                self.notes.as_deref(),
                today,
                milestone,
                status,
                text,
            ));
        }
    }
}

impl AggregateRoot for Shipment {
    type Id = ShipmentId;

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
        "a006"
    }

    fn collection_name() -> &'static str {
        "shipment"
    }

    fn element_name() -> &'static str {
        "Shipment"
    }

    fn list_name() -> &'static str {
        "Shipments"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShipmentDto {
    pub id: Option<String>,
    #[serde(alias = "forecastId")]
    pub forecast_id: Option<String>,
    #[serde(alias = "shipperOrganizationId")]
    pub shipper_organization_id: Option<String>,
    #[serde(alias = "shippingOrganizationCode")]
    pub shipping_organization_code: Option<String>,
    #[serde(alias = "requestedQuantity")]
    pub requested_quantity: Option<i32>,
    #[serde(alias = "unitsPerCarton")]
    pub units_per_carton: Option<i32>,
    pub priority: Option<ShipmentPriority>,
    pub incoterms: Option<String>,
    #[serde(alias = "shipperReference")]
    pub shipper_reference: Option<String>,
    #[serde(alias = "bdiReference")]
    pub bdi_reference: Option<String>,
    #[serde(alias = "estimatedShipDate")]
    pub estimated_ship_date: Option<NaiveDate>,
    #[serde(alias = "estimatedDeliveryDate")]
    pub estimated_delivery_date: Option<NaiveDate>,
    #[serde(alias = "actualShipDate")]
    pub actual_ship_date: Option<NaiveDate>,
    #[serde(alias = "actualDeliveryDate")]
    pub actual_delivery_date: Option<NaiveDate>,
    pub status: Option<ShipmentStatus>,
    #[serde(alias = "pickupLocation")]
    pub pickup_location: Option<String>,
    #[serde(alias = "deliveryLocation")]
    pub delivery_location: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "specialInstructions")]
    pub special_instructions: Option<String>,
    #[serde(alias = "calculatedData")]
    pub calculated_data: Option<serde_json::Value>,
    pub comment: Option<String>,
}

/// Result of a milestone status change on a shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStatusResponse {
    pub success: bool,
    pub shipment: Shipment,
    pub message: String,
    #[serde(rename = "syncedForecast")]
    pub synced_forecast: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(quantity: i32) -> Shipment {
        Shipment::new_for_insert(
            &ShipmentDto {
                requested_quantity: Some(quantity),
                ..Default::default()
            },
            "user-1".into(),
        )
    }

    #[test]
    fn defaults() {
        let shipment = sample(12);
        assert_eq!(shipment.units_per_carton, 5);
        assert_eq!(shipment.incoterms, "EXW");
        assert_eq!(shipment.priority, ShipmentPriority::Standard);
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert!(shipment.base.code.starts_with("SHP-"));
        assert_eq!(shipment.carton_count(), 3);
    }

    #[test]
    fn shipping_milestone_is_tracked() {
        let mut shipment = sample(10);
        let today = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap();
        shipment.apply_status(Milestone::Shipping, SignalStatus::Accepted, Some("booked"), today);
        assert_eq!(shipment.signals.shipping, SignalStatus::Accepted);
        assert_eq!(
            shipment.notes.as_deref(),
            Some("[2025-07-09] SHIPPING → accepted: booked")
        );
    }

    #[test]
    fn delivery_before_ship_is_rejected() {
        let mut shipment = sample(10);
        shipment.estimated_ship_date = NaiveDate::from_ymd_opt(2025, 7, 9);
        shipment.estimated_delivery_date = NaiveDate::from_ymd_opt(2025, 7, 1);
        assert!(shipment.validate().is_err());
    }
}
