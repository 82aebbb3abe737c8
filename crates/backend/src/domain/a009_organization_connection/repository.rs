use chrono::Utc;
use contracts::domain::a009_organization_connection::aggregate::{
    ConnectionStatus, ConnectionType, OrganizationConnection, OrganizationConnectionId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a009_organization_connection")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub source_organization_id: String,
    pub target_organization_id: String,
    pub connection_type: String,
    pub status: String,
    pub permissions_json: String,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OrganizationConnection {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        OrganizationConnection {
            base: BaseAggregate::with_metadata(
                OrganizationConnectionId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            source_organization_id: m.source_organization_id,
            target_organization_id: m.target_organization_id,
            connection_type: ConnectionType::parse(&m.connection_type),
            status: ConnectionStatus::parse(&m.status),
            permissions: serde_json::from_str(&m.permissions_json)
                .unwrap_or_else(|_| serde_json::json!({})),
            notes: m.notes,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &OrganizationConnection) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        source_organization_id: Set(aggregate.source_organization_id.clone()),
        target_organization_id: Set(aggregate.target_organization_id.clone()),
        connection_type: Set(aggregate.connection_type.as_str().to_string()),
        status: Set(aggregate.status.as_str().to_string()),
        permissions_json: Set(serde_json::to_string(&aggregate.permissions)?),
        notes: Set(aggregate.notes.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

pub async fn list_all() -> anyhow::Result<Vec<OrganizationConnection>> {
    let items: Vec<OrganizationConnection> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Connections where the organization is either side
pub async fn list_for_organization(
    organization_id: &str,
) -> anyhow::Result<Vec<OrganizationConnection>> {
    let items: Vec<OrganizationConnection> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(
            Condition::any()
                .add(Column::SourceOrganizationId.eq(organization_id))
                .add(Column::TargetOrganizationId.eq(organization_id)),
        )
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn find_pair(
    source: &str,
    target: &str,
    connection_type: ConnectionType,
) -> anyhow::Result<Option<OrganizationConnection>> {
    let result = Entity::find()
        .filter(Column::SourceOrganizationId.eq(source))
        .filter(Column::TargetOrganizationId.eq(target))
        .filter(Column::ConnectionType.eq(connection_type.as_str()))
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<OrganizationConnection>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &OrganizationConnection) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &OrganizationConnection) -> anyhow::Result<()> {
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
