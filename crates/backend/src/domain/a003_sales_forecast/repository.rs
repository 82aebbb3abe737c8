use chrono::{NaiveDate, Utc};
use contracts::domain::a003_sales_forecast::aggregate::{
    ForecastConfidence, ForecastStatus, MilestoneSignals, SalesForecast, SalesForecastId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata, SignalStatus};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_sales_forecast")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub sku_id: String,
    pub purchase_order_id: Option<String>,
    pub delivery_week: String,
    pub quantity: i32,
    pub confidence: String,
    pub shipping_preference: Option<String>,
    pub forecast_type: Option<String>,
    pub status: String,
    pub sales_signal: String,
    pub factory_signal: String,
    pub shipping_signal: String,
    pub transit_signal: String,
    pub warehouse_signal: String,
    pub notes: Option<String>,
    pub estimated_ship_date: Option<NaiveDate>,
    pub estimated_warehouse_arrival: Option<NaiveDate>,
    pub confirmed_delivery_date: Option<NaiveDate>,
    pub date_change_reason: Option<String>,
    pub last_date_change_at: Option<chrono::DateTime<chrono::Utc>>,
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

impl From<Model> for SalesForecast {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        SalesForecast {
            base: BaseAggregate::with_metadata(
                SalesForecastId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            sku_id: m.sku_id,
            purchase_order_id: m.purchase_order_id,
            delivery_week: m.delivery_week,
            quantity: m.quantity,
            confidence: ForecastConfidence::parse(&m.confidence),
            shipping_preference: m.shipping_preference,
            forecast_type: m.forecast_type,
            status: ForecastStatus::parse(&m.status).unwrap_or_default(),
            signals: MilestoneSignals {
                sales: SignalStatus::from_str_lossy(&m.sales_signal),
                factory: SignalStatus::from_str_lossy(&m.factory_signal),
                shipping: SignalStatus::from_str_lossy(&m.shipping_signal),
                transit: SignalStatus::from_str_lossy(&m.transit_signal),
                warehouse: SignalStatus::from_str_lossy(&m.warehouse_signal),
            },
            notes: m.notes,
            estimated_ship_date: m.estimated_ship_date,
            estimated_warehouse_arrival: m.estimated_warehouse_arrival,
            confirmed_delivery_date: m.confirmed_delivery_date,
            date_change_reason: m.date_change_reason,
            last_date_change_at: m.last_date_change_at,
            created_by: m.created_by,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &SalesForecast) -> ActiveModel {
    let signals = &aggregate.signals;
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        sku_id: Set(aggregate.sku_id.clone()),
        purchase_order_id: Set(aggregate.purchase_order_id.clone()),
        delivery_week: Set(aggregate.delivery_week.clone()),
        quantity: Set(aggregate.quantity),
        confidence: Set(aggregate.confidence.as_str().to_string()),
        shipping_preference: Set(aggregate.shipping_preference.clone()),
        forecast_type: Set(aggregate.forecast_type.clone()),
        status: Set(aggregate.status.as_str().to_string()),
        sales_signal: Set(signals.sales.as_str().to_string()),
        factory_signal: Set(signals.factory.as_str().to_string()),
        shipping_signal: Set(signals.shipping.as_str().to_string()),
        transit_signal: Set(signals.transit.as_str().to_string()),
        warehouse_signal: Set(signals.warehouse.as_str().to_string()),
        notes: Set(aggregate.notes.clone()),
        estimated_ship_date: Set(aggregate.estimated_ship_date),
        estimated_warehouse_arrival: Set(aggregate.estimated_warehouse_arrival),
        confirmed_delivery_date: Set(aggregate.confirmed_delivery_date),
        date_change_reason: Set(aggregate.date_change_reason.clone()),
        last_date_change_at: Set(aggregate.last_date_change_at),
        created_by: Set(aggregate.created_by.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

/// Newest first
pub async fn list_all() -> anyhow::Result<Vec<SalesForecast>> {
    let items: Vec<SalesForecast> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Forecasts entered by any of the given users, newest first
pub async fn list_created_by(user_ids: &[String]) -> anyhow::Result<Vec<SalesForecast>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<SalesForecast> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::CreatedBy.is_in(user_ids.iter().cloned()))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<SalesForecast>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &SalesForecast) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate).insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &SalesForecast) -> anyhow::Result<()> {
    let mut active = to_active(aggregate);
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
