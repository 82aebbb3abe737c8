use crate::domain::common::{
    append_milestone_note, AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Milestone,
    Origin, SignalStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalesForecastId(pub Uuid);

impl SalesForecastId {
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

impl AggregateId for SalesForecastId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(SalesForecastId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Committed,
}

impl ForecastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastStatus::Draft => "draft",
            ForecastStatus::Submitted => "submitted",
            ForecastStatus::Approved => "approved",
            ForecastStatus::Committed => "committed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ForecastStatus::Draft),
            "submitted" => Some(ForecastStatus::Submitted),
            "approved" => Some(ForecastStatus::Approved),
            "committed" => Some(ForecastStatus::Committed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecastConfidence {
    Low,
    #[default]
    Medium,
    High,
}

impl ForecastConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastConfidence::Low => "low",
            ForecastConfidence::Medium => "medium",
            ForecastConfidence::High => "high",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "low" => ForecastConfidence::Low,
            "high" => ForecastConfidence::High,
            _ => ForecastConfidence::Medium,
        }
    }
}

/// Signals of every CPFR stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneSignals {
    pub sales: SignalStatus,
    pub factory: SignalStatus,
    pub shipping: SignalStatus,
    pub transit: SignalStatus,
    pub warehouse: SignalStatus,
}

impl MilestoneSignals {
    pub fn get(&self, milestone: Milestone) -> SignalStatus {
        match milestone {
            Milestone::Sales => self.sales,
            Milestone::Factory => self.factory,
            Milestone::Shipping => self.shipping,
            Milestone::Transit => self.transit,
            Milestone::Warehouse => self.warehouse,
        }
    }

    pub fn set(&mut self, milestone: Milestone, status: SignalStatus) {
        match milestone {
            Milestone::Sales => self.sales = status,
            Milestone::Factory => self.factory = status,
            Milestone::Shipping => self.shipping = status,
            Milestone::Transit => self.transit = status,
            Milestone::Warehouse => self.warehouse = status,
        }
    }
}

/// Date fields a shipment may push onto its forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastDateChanges {
    pub estimated_ship_date: Option<NaiveDate>,
    pub estimated_warehouse_arrival: Option<NaiveDate>,
    pub confirmed_delivery_date: Option<NaiveDate>,
}

impl ForecastDateChanges {
    pub fn is_empty(&self) -> bool {
        self.estimated_ship_date.is_none()
            && self.estimated_warehouse_arrival.is_none()
            && self.confirmed_delivery_date.is_none()
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Demand forecast for one SKU in one delivery week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesForecast {
    #[serde(flatten)]
    pub base: BaseAggregate<SalesForecastId>,

    pub sku_id: String,
    pub purchase_order_id: Option<String>,
    /// ISO week, e.g. "2025-W14"
    pub delivery_week: String,
    pub quantity: i32,
    pub confidence: ForecastConfidence,
    pub shipping_preference: Option<String>,
    pub forecast_type: Option<String>,
    pub status: ForecastStatus,
    pub signals: MilestoneSignals,
    pub notes: Option<String>,
    pub estimated_ship_date: Option<NaiveDate>,
    pub estimated_warehouse_arrival: Option<NaiveDate>,
    pub confirmed_delivery_date: Option<NaiveDate>,
    pub date_change_reason: Option<String>,
    pub last_date_change_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

impl SalesForecast {
    pub fn new_for_insert(dto: &SalesForecastDto, sku_code: &str, created_by: String) -> Self {
        let id = SalesForecastId::new_v4();
        let code = format!("FC-{}", &id.as_string()[..8]).to_uppercase();
        let week = dto.delivery_week.clone().unwrap_or_default();
        let mut base = BaseAggregate::new(id, code, format!("{} / {}", sku_code, week));
        base.comment = dto.comment.clone();

        Self {
            base,
            sku_id: dto.sku_id.clone().unwrap_or_default(),
            purchase_order_id: dto.purchase_order_id.clone(),
            delivery_week: week,
            quantity: dto.quantity.unwrap_or_default(),
            confidence: dto.confidence.unwrap_or_default(),
            shipping_preference: dto.shipping_preference.clone(),
            forecast_type: dto.forecast_type.clone(),
            status: dto.status.unwrap_or_default(),
            signals: MilestoneSignals::default(),
            notes: dto.notes.clone(),
            estimated_ship_date: None,
            estimated_warehouse_arrival: None,
            confirmed_delivery_date: None,
            date_change_reason: None,
            last_date_change_at: None,
            created_by,
        }
    }

    pub fn update(&mut self, dto: &SalesForecastDto) {
        if let Some(week) = &dto.delivery_week {
            self.delivery_week = week.clone();
        }
        if let Some(quantity) = dto.quantity {
            self.quantity = quantity;
        }
        if let Some(confidence) = dto.confidence {
            self.confidence = confidence;
        }
        if let Some(status) = dto.status {
            self.status = status;
        }
        if dto.purchase_order_id.is_some() {
            self.purchase_order_id = dto.purchase_order_id.clone();
        }
        if dto.shipping_preference.is_some() {
            self.shipping_preference = dto.shipping_preference.clone();
        }
        if dto.forecast_type.is_some() {
            self.forecast_type = dto.forecast_type.clone();
        }
        if dto.notes.is_some() {
            self.notes = dto.notes.clone();
        }
        self.base.comment = dto.comment.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sku_id.trim().is_empty() {
            return Err("SKU is required".into());
        }
        if !is_iso_week(&self.delivery_week) {
            return Err("Delivery week must look like YYYY-Www".into());
        }
        if self.quantity <= 0 {
            return Err("Quantity must be positive".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }

    /// Records a milestone signal; the sales milestone also drives the forecast status.
    pub fn apply_status(
        &mut self,
        milestone: Milestone,
        status: SignalStatus,
        notes: Option<&str>,
        today: NaiveDate,
    ) {
        self.signals.set(milestone, status);
        if milestone == Milestone::Sales {
            self.status = match status {
                SignalStatus::Accepted | SignalStatus::Submitted => ForecastStatus::Submitted,
                _ => ForecastStatus::Draft,
            };
        }
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

    pub fn apply_date_changes(&mut self, changes: &ForecastDateChanges, reason: Option<String>) {
        if changes.is_empty() {
            return;
        }
        if changes.estimated_ship_date.is_some() {
            self.estimated_ship_date = changes.estimated_ship_date;
        }
        if changes.estimated_warehouse_arrival.is_some() {
            self.estimated_warehouse_arrival = changes.estimated_warehouse_arrival;
        }
        if changes.confirmed_delivery_date.is_some() {
            self.confirmed_delivery_date = changes.confirmed_delivery_date;
        }
        if reason.is_some() {
            self.date_change_reason = reason;
            self.last_date_change_at = Some(Utc::now());
        }
    }
}

/// Accepts "YYYY-Www" with week 01..53
pub fn is_iso_week(value: &str) -> bool {
    let Some((year, week)) = value.split_once("-W") else {
        return false;
    };
    year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && week.len() == 2
        && matches!(week.parse::<u32>(), Ok(1..=53))
}

impl AggregateRoot for SalesForecast {
    type Id = SalesForecastId;

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
        "a003"
    }

    fn collection_name() -> &'static str {
        "sales_forecast"
    }

    fn element_name() -> &'static str {
        "Sales forecast"
    }

    fn list_name() -> &'static str {
        "Sales forecasts"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SalesForecastDto {
    pub id: Option<String>,
    #[serde(alias = "skuId")]
    pub sku_id: Option<String>,
    #[serde(alias = "purchaseOrderId")]
    pub purchase_order_id: Option<String>,
    #[serde(alias = "deliveryWeek")]
    pub delivery_week: Option<String>,
    pub quantity: Option<i32>,
    pub confidence: Option<ForecastConfidence>,
    #[serde(alias = "shippingPreference")]
    pub shipping_preference: Option<String>,
    #[serde(alias = "forecastType")]
    pub forecast_type: Option<String>,
    pub status: Option<ForecastStatus>,
    pub notes: Option<String>,
    pub comment: Option<String>,
}

/// Body of PUT /api/cpfr/forecasts/:id/status
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MilestoneStatusRequest {
    pub milestone: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "dateChanges")]
    pub date_changes: Option<ForecastDateChanges>,
    #[serde(alias = "dateChangeReason")]
    pub date_change_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SalesForecast {
        SalesForecast::new_for_insert(
            &SalesForecastDto {
                sku_id: Some(Uuid::new_v4().to_string()),
                delivery_week: Some("2025-W14".into()),
                quantity: Some(500),
                ..Default::default()
            },
            "MNQ15",
            "user-1".into(),
        )
    }

    #[test]
    fn new_forecast_is_valid_draft() {
        let forecast = sample();
        assert!(forecast.validate().is_ok());
        assert_eq!(forecast.status, ForecastStatus::Draft);
        assert_eq!(forecast.confidence, ForecastConfidence::Medium);
        assert!(forecast.base.code.starts_with("FC-"));
    }

    #[test]
    fn iso_week_validation() {
        assert!(is_iso_week("2025-W01"));
        assert!(is_iso_week("2026-W53"));
        assert!(!is_iso_week("2025-W54"));
        assert!(!is_iso_week("2025-14"));
        assert!(!is_iso_week("25-W14"));
    }

    #[test]
    fn sales_signal_drives_status() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut forecast = sample();

        forecast.apply_status(Milestone::Sales, SignalStatus::Accepted, None, today);
        assert_eq!(forecast.status, ForecastStatus::Submitted);
        assert_eq!(forecast.signals.sales, SignalStatus::Accepted);

        forecast.apply_status(Milestone::Sales, SignalStatus::Rejected, Some("wrong qty"), today);
        assert_eq!(forecast.status, ForecastStatus::Draft);
        assert_eq!(
            forecast.notes.as_deref(),
            Some("[2025-04-01] SALES → rejected: wrong qty")
        );
    }

    #[test]
    fn factory_signal_keeps_status() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut forecast = sample();
        forecast.status = ForecastStatus::Approved;
        forecast.apply_status(Milestone::Factory, SignalStatus::Accepted, None, today);
        assert_eq!(forecast.status, ForecastStatus::Approved);
        assert_eq!(forecast.signals.factory, SignalStatus::Accepted);
    }

    #[test]
    fn date_changes_stamp_reason() {
        let mut forecast = sample();
        let changes = ForecastDateChanges {
            estimated_ship_date: NaiveDate::from_ymd_opt(2025, 5, 2),
            ..Default::default()
        };
        forecast.apply_date_changes(&changes, Some("factory delay".into()));
        assert_eq!(forecast.estimated_ship_date, NaiveDate::from_ymd_opt(2025, 5, 2));
        assert!(forecast.last_date_change_at.is_some());
    }
}
