use chrono::{NaiveDate, Utc};
use contracts::domain::a005_invoice::aggregate::{Invoice, InvoiceId, InvoiceStatus};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub customer_name: String,
    pub invoice_date: NaiveDate,
    pub requested_delivery_week: Option<String>,
    pub status: String,
    pub terms: Option<String>,
    pub incoterms: Option<String>,
    pub incoterms_location: Option<String>,
    pub bank_json: String,
    pub total_value: f64,
    pub notes: Option<String>,
    pub organization_id: Option<String>,
    pub created_by: String,
    pub lines_json: String,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Invoice {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Invoice {
            base: BaseAggregate::with_metadata(
                InvoiceId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            customer_name: m.customer_name,
            invoice_date: m.invoice_date,
            requested_delivery_week: m.requested_delivery_week,
            status: InvoiceStatus::parse(&m.status),
            terms: m.terms,
            incoterms: m.incoterms,
            incoterms_location: m.incoterms_location,
            bank: serde_json::from_str(&m.bank_json).unwrap_or_default(),
            total_value: m.total_value,
            notes: m.notes,
            organization_id: m.organization_id,
            created_by: m.created_by,
            lines: serde_json::from_str(&m.lines_json).unwrap_or_default(),
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &Invoice) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        customer_name: Set(aggregate.customer_name.clone()),
        invoice_date: Set(aggregate.invoice_date),
        requested_delivery_week: Set(aggregate.requested_delivery_week.clone()),
        status: Set(aggregate.status.as_str().to_string()),
        terms: Set(aggregate.terms.clone()),
        incoterms: Set(aggregate.incoterms.clone()),
        incoterms_location: Set(aggregate.incoterms_location.clone()),
        bank_json: Set(serde_json::to_string(&aggregate.bank)?),
        total_value: Set(aggregate.total_value),
        notes: Set(aggregate.notes.clone()),
        organization_id: Set(aggregate.organization_id.clone()),
        created_by: Set(aggregate.created_by.clone()),
        lines_json: Set(serde_json::to_string(&aggregate.lines)?),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

pub async fn list(organization_id: Option<&str>) -> anyhow::Result<Vec<Invoice>> {
    let mut query = Entity::find().filter(Column::IsDeleted.eq(false));
    if let Some(org) = organization_id {
        query = query.filter(Column::OrganizationId.eq(org));
    }
    let items: Vec<Invoice> = query
        .order_by_desc(Column::InvoiceDate)
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Invoice>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_code(code: &str) -> anyhow::Result<Option<Invoice>> {
    let result = Entity::find()
        .filter(Column::Code.eq(code))
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Invoice) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Invoice) -> anyhow::Result<()> {
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
