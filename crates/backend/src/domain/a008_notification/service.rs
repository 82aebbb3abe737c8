use super::repository;
use chrono::Utc;
use contracts::domain::a008_notification::aggregate::{
    BulkNotificationResult, CreateNotificationParams, DeliveryStatus, Notification,
    NotificationChannel, NotificationListQuery,
};
use contracts::system::users::User;
use futures::future::join_all;
use uuid::Uuid;

use crate::shared::config;
use crate::shared::messaging::{email, whatsapp};
use crate::system::users;

const DEFAULT_ACTION_LABEL: &str = "View Details";

/// Portal-relative links ("/cpfr/...") are prefixed with the public base URL
pub fn absolute_link(url: &str, base: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

fn external_link(notification: &Notification) -> Option<String> {
    notification
        .action_url
        .as_deref()
        .map(|url| absolute_link(url, &config::get().server.public_url))
}

/// WhatsApp text: bold title, message, then the link when there is one
pub fn whatsapp_body(notification: &Notification) -> String {
    let mut body = format!("*{}*\n\n{}", notification.title, notification.message);
    if let Some(url) = external_link(notification) {
        body.push_str(&format!("\n\nView: {}", url));
    }
    body
}

pub fn email_html(notification: &Notification) -> String {
    let label = notification
        .action_label
        .as_deref()
        .unwrap_or(DEFAULT_ACTION_LABEL);
    email::notification_html(
        &notification.title,
        &notification.message,
        external_link(notification).as_deref().map(|url| (url, label)),
    )
}

async fn deliver_email(notification: &Notification, address: &str) -> DeliveryStatus {
    if !email::is_configured() {
        return DeliveryStatus::Disabled;
    }
    let message = email::EmailMessage {
        to: vec![address.to_string()],
        subject: notification.title.clone(),
        html: email_html(notification),
        text: Some(notification.message.clone()),
    };
    match email::send_email(&message).await {
        Ok(_) => DeliveryStatus::Sent,
        Err(e) => {
            tracing::error!(
                "Email delivery of {} failed: {}",
                notification.base.code,
                e
            );
            DeliveryStatus::Failed
        }
    }
}

async fn deliver_whatsapp(notification: &mut Notification, user: &User, phone: &str) -> DeliveryStatus {
    let organization_id = user.organization_id.as_deref();
    if !whatsapp::is_enabled(organization_id).await {
        return DeliveryStatus::Disabled;
    }

    let message = whatsapp::WhatsAppMessage {
        to: whatsapp::format_phone_number(phone, "+1"),
        body: whatsapp_body(notification),
        media_url: None,
    };
    match whatsapp::send_message(&message, organization_id).await {
        Ok(sent) => {
            notification.whatsapp_message_id = Some(sent.message_sid);
            notification.whatsapp_status = Some(sent.status);
            DeliveryStatus::Sent
        }
        Err(e) => {
            tracing::error!(
                "WhatsApp delivery of {} failed: {}",
                notification.base.code,
                e
            );
            notification.whatsapp_status = Some("failed".into());
            notification.whatsapp_error_code = Some(e.code());
            notification.whatsapp_error_message = Some(e.to_string());
            DeliveryStatus::Failed
        }
    }
}

/// Stores the notification and pushes it to the requested channels.
/// Returns None when the recipient does not exist.
pub async fn create(params: CreateNotificationParams) -> anyhow::Result<Option<Notification>> {
    let Some(user) = users::service::get_by_id(&params.user_id).await? else {
        tracing::warn!("Notification skipped: user {} not found", params.user_id);
        return Ok(None);
    };

    let mut notification = Notification::new_for_insert(&params);
    notification
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    notification.before_write();
    repository::insert(&notification).await?;

    if notification.wants(NotificationChannel::Email) {
        if let Some(address) = user.email.as_deref().filter(|e| !e.is_empty()) {
            let status = deliver_email(&notification, address).await;
            notification
                .delivery_status
                .insert(NotificationChannel::Email, status);
        }
    }

    if notification.wants(NotificationChannel::Whatsapp) {
        if let Some(phone) = user.phone.as_deref().filter(|p| !p.is_empty()) {
            let status = deliver_whatsapp(&mut notification, &user, phone).await;
            notification
                .delivery_status
                .insert(NotificationChannel::Whatsapp, status);
        }
    }

    notification.before_write();
    repository::update(&notification).await?;
    Ok(Some(notification))
}

pub async fn create_bulk(
    user_ids: &[String],
    params: CreateNotificationParams,
) -> BulkNotificationResult {
    let results = join_all(user_ids.iter().map(|user_id| {
        let mut params = params.clone();
        params.user_id = user_id.clone();
        create(params)
    }))
    .await;

    let successful = results
        .iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        tracing::error!("Bulk notification failed: {}", err);
    }
    BulkNotificationResult {
        total: user_ids.len(),
        successful,
        failed: user_ids.len() - successful,
    }
}

pub async fn list(user_id: &str, query: &NotificationListQuery) -> anyhow::Result<Vec<Notification>> {
    repository::list(user_id, query, Utc::now()).await
}

pub async fn unread_count(user_id: &str) -> anyhow::Result<u64> {
    repository::unread_count(user_id, Utc::now()).await
}

pub async fn mark_read(id: Uuid, user_id: &str) -> anyhow::Result<bool> {
    repository::mark_read(id, user_id).await
}

pub async fn mark_all_read(user_id: &str) -> anyhow::Result<u64> {
    repository::mark_all_read(user_id).await
}

pub async fn delete(id: Uuid, user_id: &str) -> anyhow::Result<bool> {
    repository::soft_delete(id, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a008_notification::aggregate::NotificationType;

    #[test]
    fn relative_links_use_public_url() {
        assert_eq!(
            absolute_link("/cpfr/shipments/7", "https://portal.example/"),
            "https://portal.example/cpfr/shipments/7"
        );
        assert_eq!(
            absolute_link("https://other.example/x", "https://portal.example"),
            "https://other.example/x"
        );
    }

    fn params(action_url: Option<&str>) -> CreateNotificationParams {
        CreateNotificationParams {
            user_id: "user-1".into(),
            notification_type: NotificationType::Shipment,
            title: "Shipment delayed".into(),
            message: "New ETA is 2025-05-02".into(),
            priority: None,
            category: None,
            action_url: action_url.map(Into::into),
            action_label: None,
            related_entity_type: None,
            related_entity_id: None,
            metadata: None,
            channels: Some(vec![NotificationChannel::Email]),
            expires_at: None,
        }
    }

    #[test]
    fn whatsapp_body_bolds_title_and_appends_link() {
        let n = Notification::new_for_insert(&params(Some("https://portal.example/s/1")));
        assert_eq!(
            whatsapp_body(&n),
            "*Shipment delayed*\n\nNew ETA is 2025-05-02\n\nView: https://portal.example/s/1"
        );

        let plain = Notification::new_for_insert(&params(None));
        assert_eq!(whatsapp_body(&plain), "*Shipment delayed*\n\nNew ETA is 2025-05-02");
    }

    #[test]
    fn email_uses_default_button_label() {
        let n = Notification::new_for_insert(&params(Some("https://portal.example/s/1")));
        let html = email_html(&n);
        assert!(html.starts_with("<h2>Shipment delayed</h2><p>New ETA is 2025-05-02</p>"));
        assert!(html.contains("View Details"));
        assert!(html.contains("This is an automated message from BDI Business Portal."));
    }

    #[test]
    fn portal_channel_is_always_delivered() {
        let n = Notification::new_for_insert(&params(None));
        assert!(n.wants(NotificationChannel::Portal));
        assert_eq!(
            n.delivery_status.get(&NotificationChannel::Portal),
            Some(&DeliveryStatus::Delivered)
        );
    }
}
