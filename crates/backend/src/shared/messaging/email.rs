use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::config::{self, env_secret};

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// Strips scripts, handlers and other unsafe markup before HTML leaves the server
pub fn sanitize_html(html: &str) -> String {
    ammonia::Builder::default()
        .add_tag_attributes("a", &["style"])
        .add_tag_attributes("p", &["style"])
        .add_tag_attributes("td", &["style"])
        .add_tag_attributes("th", &["style"])
        .clean(html)
        .to_string()
}

pub fn is_configured() -> bool {
    env_secret("RESEND_API_KEY").is_some()
}

/// Sends through Resend; returns the provider message id
pub async fn send_email(message: &EmailMessage) -> Result<String> {
    let api_key = env_secret("RESEND_API_KEY").context("RESEND_API_KEY is not set")?;
    if message.to.is_empty() {
        anyhow::bail!("Email has no recipients");
    }

    let cfg = &config::get().email;
    let body = ResendRequest {
        from: &cfg.from_address,
        to: &message.to,
        subject: &message.subject,
        html: sanitize_html(&message.html),
        text: message.text.as_deref(),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = client
        .post(&cfg.api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .context("Resend request failed")?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::error!("Resend rejected email '{}': {} {}", message.subject, status, text);
        anyhow::bail!("Email provider returned {}: {}", status, text);
    }

    let sent: ResendResponse = response.json().await?;
    tracing::info!("Email '{}' sent: {}", message.subject, sent.id);
    Ok(sent.id)
}

/// Standard notification layout with an optional call-to-action button
pub fn notification_html(title: &str, message: &str, action: Option<(&str, &str)>) -> String {
    let button = action
        .map(|(url, label)| {
            format!(
                r#"<p><a href="{}" style="background-color: #10b981; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; display: inline-block;">{}</a></p>"#,
                url, label
            )
        })
        .unwrap_or_default();
    format!(
        r#"<h2>{}</h2><p>{}</p>{}<hr><p style="color: #666; font-size: 12px;">This is an automated message from BDI Business Portal.</p>"#,
        title, message, button
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizer_removes_scripts_and_keeps_links() {
        let html = r#"<h2>PO ready</h2><script>alert(1)</script><a href="https://portal.example/po/1" onclick="steal()">Open</a>"#;
        let clean = sanitize_html(html);
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(clean.contains("https://portal.example/po/1"));
        assert!(clean.contains("<h2>PO ready</h2>"));
    }

    #[test]
    fn notification_layout_includes_action() {
        let html = notification_html(
            "Shipment delayed",
            "ETA moved",
            Some(("https://portal.example/s/1", "View Details")),
        );
        assert!(html.contains("<h2>Shipment delayed</h2>"));
        assert!(html.contains("View Details"));

        let plain = notification_html("Hello", "World", None);
        assert!(!plain.contains("<a "));
    }
}
