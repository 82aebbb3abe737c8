use chrono::{DateTime, Utc};
use contracts::domain::a010_production_file::aggregate::{
    ProductionFile, ProductionFileId, ProductionFileType,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, Select, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a010_production_file")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub forecast_id: Option<String>,
    pub bdi_shipment_number: Option<String>,
    pub device_metadata_json: String,
    pub file_type: String,
    pub organization_id: String,
    pub uploaded_by: String,
    pub is_public_to_bdi: bool,
    pub tags_json: String,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ProductionFile {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        ProductionFile {
            base: BaseAggregate::with_metadata(
                ProductionFileId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            file_name: m.file_name,
            file_path: m.file_path,
            file_size: m.file_size,
            content_type: m.content_type,
            forecast_id: m.forecast_id,
            bdi_shipment_number: m.bdi_shipment_number,
            device_metadata: serde_json::from_str(&m.device_metadata_json).unwrap_or_default(),
            file_type: ProductionFileType::parse(&m.file_type).unwrap_or(ProductionFileType::Generic),
            organization_id: m.organization_id,
            uploaded_by: m.uploaded_by,
            is_public_to_bdi: m.is_public_to_bdi,
            tags: serde_json::from_str(&m.tags_json).unwrap_or_default(),
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &ProductionFile) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        file_name: Set(aggregate.file_name.clone()),
        file_path: Set(aggregate.file_path.clone()),
        file_size: Set(aggregate.file_size),
        content_type: Set(aggregate.content_type.clone()),
        forecast_id: Set(aggregate.forecast_id.clone()),
        bdi_shipment_number: Set(aggregate.bdi_shipment_number.clone()),
        device_metadata_json: Set(serde_json::to_string(&aggregate.device_metadata)?),
        file_type: Set(aggregate.file_type.as_str().to_string()),
        organization_id: Set(aggregate.organization_id.clone()),
        uploaded_by: Set(aggregate.uploaded_by.clone()),
        is_public_to_bdi: Set(aggregate.is_public_to_bdi),
        tags_json: Set(serde_json::to_string(&aggregate.tags)?),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

/// Search criteria. `organization_ids: None` means every organization.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub organization_ids: Option<Vec<String>>,
    pub organization_id: Option<String>,
    pub file_types: Vec<ProductionFileType>,
    pub shipment_number: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

fn filtered(filter: &FileFilter) -> Select<Entity> {
    let mut condition = Condition::all().add(Column::IsDeleted.eq(false));
    if let Some(ids) = &filter.organization_ids {
        condition = condition.add(Column::OrganizationId.is_in(ids.clone()));
    }
    if let Some(id) = &filter.organization_id {
        condition = condition.add(Column::OrganizationId.eq(id.as_str()));
    }
    if !filter.file_types.is_empty() {
        let types: Vec<&str> = filter.file_types.iter().map(|t| t.as_str()).collect();
        condition = condition.add(Column::FileType.is_in(types));
    }
    if let Some(number) = &filter.shipment_number {
        condition = condition.add(Column::BdiShipmentNumber.eq(number.as_str()));
    }
    if let Some(from) = filter.created_from {
        condition = condition.add(Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.created_to {
        condition = condition.add(Column::CreatedAt.lte(to));
    }
    Entity::find().filter(condition)
}

/// One page of matching files, newest first, plus the total match count
pub async fn search(
    filter: &FileFilter,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<ProductionFile>, u64)> {
    let total = filtered(filter).count(conn()).await?;
    let items: Vec<ProductionFile> = filtered(filter)
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok((items, total))
}

/// Files of one organization plus those shared with the internal organization
pub async fn list_visible_to(organization_id: &str) -> anyhow::Result<Vec<ProductionFile>> {
    let items: Vec<ProductionFile> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(
            Condition::any()
                .add(Column::OrganizationId.eq(organization_id))
                .add(Column::IsPublicToBdi.eq(true)),
        )
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_all() -> anyhow::Result<Vec<ProductionFile>> {
    let items: Vec<ProductionFile> = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<ProductionFile>> {
    let result = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &ProductionFile) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(conn()).await?;
    Ok(uuid)
}
