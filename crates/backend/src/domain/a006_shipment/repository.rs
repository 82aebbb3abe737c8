use chrono::{NaiveDate, Utc};
use contracts::domain::a003_sales_forecast::aggregate::MilestoneSignals;
use contracts::domain::a006_shipment::aggregate::{
    Shipment, ShipmentId, ShipmentPriority, ShipmentStatus,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata, SignalStatus};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a006_shipment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub forecast_id: Option<String>,
    pub shipper_organization_id: Option<String>,
    pub shipping_organization_code: Option<String>,
    pub requested_quantity: i32,
    pub units_per_carton: i32,
    pub priority: String,
    pub incoterms: String,
    pub shipper_reference: Option<String>,
    pub estimated_ship_date: Option<NaiveDate>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub actual_ship_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,
    pub status: String,
    pub sales_signal: String,
    pub factory_signal: String,
    pub shipping_signal: String,
    pub transit_signal: String,
    pub warehouse_signal: String,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub calculated_data_json: String,
    pub created_by: String,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Shipment {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Shipment {
            base: BaseAggregate::with_metadata(
                ShipmentId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            forecast_id: m.forecast_id,
            shipper_organization_id: m.shipper_organization_id,
            shipping_organization_code: m.shipping_organization_code,
            requested_quantity: m.requested_quantity,
            units_per_carton: m.units_per_carton,
            priority: ShipmentPriority::parse(&m.priority),
            incoterms: m.incoterms,
            shipper_reference: m.shipper_reference,
            estimated_ship_date: m.estimated_ship_date,
            estimated_delivery_date: m.estimated_delivery_date,
            actual_ship_date: m.actual_ship_date,
            actual_delivery_date: m.actual_delivery_date,
            status: ShipmentStatus::parse(&m.status),
            signals: MilestoneSignals {
                sales: SignalStatus::from_str_lossy(&m.sales_signal),
                factory: SignalStatus::from_str_lossy(&m.factory_signal),
                shipping: SignalStatus::from_str_lossy(&m.shipping_signal),
                transit: SignalStatus::from_str_lossy(&m.transit_signal),
                warehouse: SignalStatus::from_str_lossy(&m.warehouse_signal),
            },
            pickup_location: m.pickup_location,
            delivery_location: m.delivery_location,
            notes: m.notes,
            special_instructions: m.special_instructions,
            calculated_data: serde_json::from_str(&m.calculated_data_json)
                .unwrap_or_else(|_| serde_json::json!({})),
            created_by: m.created_by,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &Shipment) -> anyhow::Result<ActiveModel> {
    let signals = &aggregate.signals;
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        forecast_id: Set(aggregate.forecast_id.clone()),
        shipper_organization_id: Set(aggregate.shipper_organization_id.clone()),
        shipping_organization_code: Set(aggregate.shipping_organization_code.clone()),
        requested_quantity: Set(aggregate.requested_quantity),
        units_per_carton: Set(aggregate.units_per_carton),
        priority: Set(aggregate.priority.as_str().to_string()),
        incoterms: Set(aggregate.incoterms.clone()),
        shipper_reference: Set(aggregate.shipper_reference.clone()),
        estimated_ship_date: Set(aggregate.estimated_ship_date),
        estimated_delivery_date: Set(aggregate.estimated_delivery_date),
        actual_ship_date: Set(aggregate.actual_ship_date),
        actual_delivery_date: Set(aggregate.actual_delivery_date),
        status: Set(aggregate.status.as_str().to_string()),
        sales_signal: Set(signals.sales.as_str().to_string()),
        factory_signal: Set(signals.factory.as_str().to_string()),
        shipping_signal: Set(signals.shipping.as_str().to_string()),
        transit_signal: Set(signals.transit.as_str().to_string()),
        warehouse_signal: Set(signals.warehouse.as_str().to_string()),
        pickup_location: Set(aggregate.pickup_location.clone()),
        delivery_location: Set(aggregate.delivery_location.clone()),
        notes: Set(aggregate.notes.clone()),
        special_instructions: Set(aggregate.special_instructions.clone()),
        calculated_data_json: Set(serde_json::to_string(&aggregate.calculated_data)?),
        created_by: Set(aggregate.created_by.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

pub async fn list_all() -> anyhow::Result<Vec<Shipment>> {
    let items: Vec<Shipment> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_by_forecast(forecast_id: &str) -> anyhow::Result<Vec<Shipment>> {
    let items: Vec<Shipment> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::ForecastId.eq(forecast_id))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Shipment>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Shipment) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Shipment) -> anyhow::Result<()> {
    let mut active = to_active(aggregate)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

pub async fn soft_delete(id: Uuid) -> anyhow::Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
