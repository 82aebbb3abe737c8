use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
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

impl AggregateId for NotificationId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(NotificationId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    System,
    Order,
    Shipment,
    Rma,
    Cpfr,
    User,
    Alert,
    Message,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::System => "system",
            NotificationType::Order => "order",
            NotificationType::Shipment => "shipment",
            NotificationType::Rma => "rma",
            NotificationType::Cpfr => "cpfr",
            NotificationType::User => "user",
            NotificationType::Alert => "alert",
            NotificationType::Message => "message",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(NotificationType::System),
            "order" => Some(NotificationType::Order),
            "shipment" => Some(NotificationType::Shipment),
            "rma" => Some(NotificationType::Rma),
            "cpfr" => Some(NotificationType::Cpfr),
            "user" => Some(NotificationType::User),
            "alert" => Some(NotificationType::Alert),
            "message" => Some(NotificationType::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "low" => NotificationPriority::Low,
            "high" => NotificationPriority::High,
            "urgent" => NotificationPriority::Urgent,
            _ => NotificationPriority::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Portal,
    Email,
    Whatsapp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Portal => "portal",
            NotificationChannel::Email => "email",
            NotificationChannel::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Sent,
    Failed,
    Disabled,
}

pub type DeliveryStatusMap = BTreeMap<NotificationChannel, DeliveryStatus>;

// ============================================================================
// Aggregate Root
// ============================================================================

/// In-portal notification, optionally fanned out to email and WhatsApp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub base: BaseAggregate<NotificationId>,

    pub user_id: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub category: Option<String>,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    pub metadata: serde_json::Value,
    pub channels: Vec<NotificationChannel>,
    pub delivery_status: DeliveryStatusMap,
    pub read_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub whatsapp_message_id: Option<String>,
    pub whatsapp_status: Option<String>,
    pub whatsapp_error_code: Option<String>,
    pub whatsapp_error_message: Option<String>,
}

impl Notification {
    pub fn new_for_insert(params: &CreateNotificationParams) -> Self {
        let id = NotificationId::new_v4();
        let code = format!("NTF-{}", &id.as_string()[..8]).to_uppercase();
        let base = BaseAggregate::new(id, code, params.title.clone());

        let mut channels = params
            .channels
            .clone()
            .unwrap_or_else(|| vec![NotificationChannel::Portal]);
        if !channels.contains(&NotificationChannel::Portal) {
            channels.insert(0, NotificationChannel::Portal);
        }

        let mut delivery_status = DeliveryStatusMap::new();
        delivery_status.insert(NotificationChannel::Portal, DeliveryStatus::Delivered);

        Self {
            base,
            user_id: params.user_id.clone(),
            notification_type: params.notification_type,
            priority: params.priority.unwrap_or_default(),
            title: params.title.clone(),
            message: params.message.clone(),
            category: params.category.clone(),
            action_url: params.action_url.clone(),
            action_label: params.action_label.clone(),
            related_entity_type: params.related_entity_type.clone(),
            related_entity_id: params.related_entity_id.clone(),
            metadata: params
                .metadata
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            channels,
            delivery_status,
            read_at: None,
            deleted_at: None,
            expires_at: params.expires_at,
            whatsapp_message_id: None,
            whatsapp_status: None,
            whatsapp_error_code: None,
            whatsapp_error_message: None,
        }
    }

    pub fn wants(&self, channel: NotificationChannel) -> bool {
        self.channels.contains(&channel)
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("Recipient is required".into());
        }
        if self.title.trim().is_empty() {
            return Err("Title is required".into());
        }
        if self.message.trim().is_empty() {
            return Err("Message is required".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for Notification {
    type Id = NotificationId;

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
        "a008"
    }

    fn collection_name() -> &'static str {
        "notification"
    }

    fn element_name() -> &'static str {
        "Notification"
    }

    fn list_name() -> &'static str {
        "Notifications"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

// ============================================================================
// Requests / responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationParams {
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Option<NotificationPriority>,
    pub category: Option<String>,
    pub action_url: Option<String>,
    pub action_label: Option<String>,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub channels: Option<Vec<NotificationChannel>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkNotificationRequest {
    pub user_ids: Vec<String>,
    #[serde(flatten)]
    pub params: CreateNotificationParams,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkNotificationResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationListQuery {
    pub limit: u64,
    pub offset: u64,
    pub unread_only: bool,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
}

impl Default for NotificationListQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            unread_only: false,
            notification_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CreateNotificationParams {
        CreateNotificationParams {
            user_id: "u1".into(),
            notification_type: NotificationType::Cpfr,
            title: "Forecast submitted".into(),
            message: "MNQ15 for 2025-W14".into(),
            priority: None,
            category: None,
            action_url: None,
            action_label: None,
            related_entity_type: None,
            related_entity_id: None,
            metadata: None,
            channels: None,
            expires_at: None,
        }
    }

    #[test]
    fn portal_is_default_and_delivered() {
        let n = Notification::new_for_insert(&params());
        assert_eq!(n.channels, vec![NotificationChannel::Portal]);
        assert_eq!(n.priority, NotificationPriority::Normal);
        assert_eq!(
            n.delivery_status.get(&NotificationChannel::Portal),
            Some(&DeliveryStatus::Delivered)
        );
        assert!(!n.is_read());
    }

    #[test]
    fn portal_is_always_included() {
        let mut p = params();
        p.channels = Some(vec![NotificationChannel::Email]);
        let n = Notification::new_for_insert(&p);
        assert!(n.wants(NotificationChannel::Portal));
        assert!(n.wants(NotificationChannel::Email));
        assert!(!n.wants(NotificationChannel::Whatsapp));
    }

    #[test]
    fn list_query_defaults() {
        let q: NotificationListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 50);
        assert_eq!(q.offset, 0);
        assert!(!q.unread_only);
    }

    #[test]
    fn expiry() {
        let mut n = Notification::new_for_insert(&params());
        let now = Utc::now();
        assert!(!n.is_expired(now));
        n.expires_at = Some(now - chrono::Duration::minutes(1));
        assert!(n.is_expired(now));
    }
}
