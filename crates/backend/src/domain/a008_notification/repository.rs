use chrono::{DateTime, Utc};
use contracts::domain::a008_notification::aggregate::{
    Notification, NotificationId, NotificationListQuery, NotificationPriority, NotificationType,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, Select, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a008_notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub user_id: String,
    pub notification_type: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub category: Option<String>,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    pub metadata_json: String,
    pub channels_json: String,
    pub delivery_status_json: String,
    pub read_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub whatsapp_message_id: Option<String>,
    pub whatsapp_status: Option<String>,
    pub whatsapp_error_code: Option<String>,
    pub whatsapp_error_message: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            is_posted: m.is_posted,
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Notification {
            base: BaseAggregate::with_metadata(
                NotificationId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            user_id: m.user_id,
            notification_type: NotificationType::parse(&m.notification_type)
                .unwrap_or(NotificationType::System),
            priority: NotificationPriority::parse(&m.priority),
            title: m.title,
            message: m.message,
            category: m.category,
            action_url: m.action_url,
            action_label: m.action_label,
            related_entity_type: m.related_entity_type,
            related_entity_id: m.related_entity_id,
            metadata: serde_json::from_str(&m.metadata_json)
                .unwrap_or_else(|_| serde_json::json!({})),
            channels: serde_json::from_str(&m.channels_json).unwrap_or_default(),
            delivery_status: serde_json::from_str(&m.delivery_status_json).unwrap_or_default(),
            read_at: m.read_at,
            deleted_at: m.deleted_at,
            expires_at: m.expires_at,
            whatsapp_message_id: m.whatsapp_message_id,
            whatsapp_status: m.whatsapp_status,
            whatsapp_error_code: m.whatsapp_error_code,
            whatsapp_error_message: m.whatsapp_error_message,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn to_active(aggregate: &Notification) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        user_id: Set(aggregate.user_id.clone()),
        notification_type: Set(aggregate.notification_type.as_str().to_string()),
        priority: Set(aggregate.priority.as_str().to_string()),
        title: Set(aggregate.title.clone()),
        message: Set(aggregate.message.clone()),
        category: Set(aggregate.category.clone()),
        action_url: Set(aggregate.action_url.clone()),
        action_label: Set(aggregate.action_label.clone()),
        related_entity_type: Set(aggregate.related_entity_type.clone()),
        related_entity_id: Set(aggregate.related_entity_id.clone()),
        metadata_json: Set(serde_json::to_string(&aggregate.metadata)?),
        channels_json: Set(serde_json::to_string(&aggregate.channels)?),
        delivery_status_json: Set(serde_json::to_string(&aggregate.delivery_status)?),
        read_at: Set(aggregate.read_at),
        deleted_at: Set(aggregate.deleted_at),
        expires_at: Set(aggregate.expires_at),
        whatsapp_message_id: Set(aggregate.whatsapp_message_id.clone()),
        whatsapp_status: Set(aggregate.whatsapp_status.clone()),
        whatsapp_error_code: Set(aggregate.whatsapp_error_code.clone()),
        whatsapp_error_message: Set(aggregate.whatsapp_error_message.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        is_posted: Set(aggregate.base.metadata.is_posted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

/// Live notifications of a user: not deleted and not expired at `now`
fn live_for(user_id: &str, now: DateTime<Utc>) -> Select<Entity> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::DeletedAt.is_null())
        .filter(
            Condition::any()
                .add(Column::ExpiresAt.is_null())
                .add(Column::ExpiresAt.gt(now)),
        )
}

pub async fn list(
    user_id: &str,
    query: &NotificationListQuery,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<Notification>> {
    let mut select = live_for(user_id, now);
    if query.unread_only {
        select = select.filter(Column::ReadAt.is_null());
    }
    if let Some(kind) = query.notification_type {
        select = select.filter(Column::NotificationType.eq(kind.as_str()));
    }
    let items: Vec<Notification> = select
        .order_by_desc(Column::CreatedAt)
        .offset(query.offset)
        .limit(query.limit)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn unread_count(user_id: &str, now: DateTime<Utc>) -> anyhow::Result<u64> {
    let count = live_for(user_id, now)
        .filter(Column::ReadAt.is_null())
        .count(conn())
        .await?;
    Ok(count)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Notification>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn insert(aggregate: &Notification) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Notification) -> anyhow::Result<()> {
    let mut active = to_active(aggregate)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

/// Only the owner's unread row is touched
pub async fn mark_read(id: Uuid, user_id: &str) -> anyhow::Result<bool> {
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::ReadAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::ReadAt.is_null())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn mark_all_read(user_id: &str) -> anyhow::Result<u64> {
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::ReadAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::ReadAt.is_null())
        .filter(Column::DeletedAt.is_null())
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}

/// Notifications are hidden through `deleted_at` rather than the aggregate flag
pub async fn soft_delete(id: Uuid, user_id: &str) -> anyhow::Result<bool> {
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::DeletedAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::DeletedAt.is_null())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
