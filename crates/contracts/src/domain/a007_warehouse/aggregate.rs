use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehouseId(pub Uuid);

impl WarehouseId {
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

impl AggregateId for WarehouseId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(WarehouseId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseType {
    #[default]
    Warehouse,
    DistributionCenter,
    FulfillmentCenter,
    CrossDock,
    ColdStorage,
    Bonded,
}

impl WarehouseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseType::Warehouse => "warehouse",
            WarehouseType::DistributionCenter => "distribution_center",
            WarehouseType::FulfillmentCenter => "fulfillment_center",
            WarehouseType::CrossDock => "cross_dock",
            WarehouseType::ColdStorage => "cold_storage",
            WarehouseType::Bonded => "bonded",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "distribution_center" => WarehouseType::DistributionCenter,
            "fulfillment_center" => WarehouseType::FulfillmentCenter,
            "cross_dock" => WarehouseType::CrossDock,
            "cold_storage" => WarehouseType::ColdStorage,
            "bonded" => WarehouseType::Bonded,
            _ => WarehouseType::Warehouse,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarehouseCapabilities {
    pub air_freight: bool,
    pub sea_freight: bool,
    pub truck_loading: bool,
    pub rail_access: bool,
    pub cold_storage: bool,
    pub hazmat_handling: bool,
}

/// Storage location. `base.code` is the warehouse code, `base.description` its name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    #[serde(flatten)]
    pub base: BaseAggregate<WarehouseId>,

    pub warehouse_type: WarehouseType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub capabilities: WarehouseCapabilities,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub max_pallet_height_cm: i32,
    pub max_pallet_weight_kg: i32,
    pub loading_dock_count: i32,
    pub storage_capacity_sqm: i32,
    pub is_active: bool,
    pub organization_id: Option<String>,
}

impl Warehouse {
    pub fn new_for_insert(dto: &WarehouseDto, organization_id: Option<String>) -> Self {
        let mut base = BaseAggregate::new(
            WarehouseId::new_v4(),
            dto.code.trim().to_uppercase(),
            dto.description.clone(),
        );
        base.comment = dto.comment.clone();

        Self {
            base,
            warehouse_type: dto.warehouse_type.unwrap_or_default(),
            address: dto.address.clone(),
            city: dto.city.clone(),
            state: dto.state.clone(),
            country: dto.country.clone(),
            postal_code: dto.postal_code.clone(),
            capabilities: dto.capabilities.clone().unwrap_or_default(),
            contact_name: dto.contact_name.clone(),
            contact_email: dto.contact_email.clone(),
            contact_phone: dto.contact_phone.clone(),
            max_pallet_height_cm: dto.max_pallet_height_cm.unwrap_or(180),
            max_pallet_weight_kg: dto.max_pallet_weight_kg.unwrap_or(1000),
            loading_dock_count: dto.loading_dock_count.unwrap_or(1),
            storage_capacity_sqm: dto.storage_capacity_sqm.unwrap_or(1000),
            is_active: dto.is_active.unwrap_or(true),
            organization_id,
        }
    }

    pub fn update(&mut self, dto: &WarehouseDto) {
        self.base.code = dto.code.trim().to_uppercase();
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        if let Some(kind) = dto.warehouse_type {
            self.warehouse_type = kind;
        }
        self.address = dto.address.clone();
        self.city = dto.city.clone();
        self.state = dto.state.clone();
        self.country = dto.country.clone();
        self.postal_code = dto.postal_code.clone();
        if let Some(capabilities) = &dto.capabilities {
            self.capabilities = capabilities.clone();
        }
        self.contact_name = dto.contact_name.clone();
        self.contact_email = dto.contact_email.clone();
        self.contact_phone = dto.contact_phone.clone();
        if let Some(v) = dto.max_pallet_height_cm {
            self.max_pallet_height_cm = v;
        }
        if let Some(v) = dto.max_pallet_weight_kg {
            self.max_pallet_weight_kg = v;
        }
        if let Some(v) = dto.loading_dock_count {
            self.loading_dock_count = v;
        }
        if let Some(v) = dto.storage_capacity_sqm {
            self.storage_capacity_sqm = v;
        }
        if let Some(active) = dto.is_active {
            self.is_active = active;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.is_empty() {
            return Err("Warehouse code is required".into());
        }
        if self.base.description.trim().is_empty() {
            return Err("Warehouse name is required".into());
        }
        if self.max_pallet_height_cm <= 0 || self.max_pallet_weight_kg <= 0 {
            return Err("Pallet limits must be positive".into());
        }
        if self.loading_dock_count < 0 || self.storage_capacity_sqm < 0 {
            return Err("Dock count and capacity cannot be negative".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for Warehouse {
    type Id = WarehouseId;

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
        "a007"
    }

    fn collection_name() -> &'static str {
        "warehouse"
    }

    fn element_name() -> &'static str {
        "Warehouse"
    }

    fn list_name() -> &'static str {
        "Warehouses"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseDto {
    pub id: Option<String>,
    pub code: String,
    pub description: String,
    pub warehouse_type: Option<WarehouseType>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub capabilities: Option<WarehouseCapabilities>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub max_pallet_height_cm: Option<i32>,
    pub max_pallet_weight_kg: Option<i32>,
    pub loading_dock_count: Option<i32>,
    pub storage_capacity_sqm: Option<i32>,
    pub is_active: Option<bool>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_defaults() {
        let warehouse = Warehouse::new_for_insert(
            &WarehouseDto {
                code: "lax-01".into(),
                description: "Los Angeles".into(),
                ..Default::default()
            },
            None,
        );
        assert_eq!(warehouse.base.code, "LAX-01");
        assert_eq!(warehouse.max_pallet_height_cm, 180);
        assert_eq!(warehouse.max_pallet_weight_kg, 1000);
        assert_eq!(warehouse.loading_dock_count, 1);
        assert_eq!(warehouse.storage_capacity_sqm, 1000);
        assert!(warehouse.validate().is_ok());
    }

    #[test]
    fn capabilities_use_camel_case() {
        let caps: WarehouseCapabilities =
            serde_json::from_str(r#"{"airFreight": true, "hazmatHandling": true}"#).unwrap();
        assert!(caps.air_freight && caps.hazmat_handling);
        assert!(!caps.cold_storage);
    }
}
