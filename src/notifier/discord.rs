use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::Notify;
use crate::config::AppConfig;
use crate::domain::Alert;
use crate::error::{Result, WhaleError};
use crate::utils::{format_amount, format_usd};

const EMBED_TITLE: &str = "🐋 Whale Transfer Detected!";
const EMBED_COLOR: u32 = 0x00ffcc;
const FOOTER_TEXT: &str = "SOL Whale Tracker";

#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    footer_icon_url: Option<String>,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(client: reqwest::Client, webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            footer_icon_url: None,
            client,
        }
    }

    pub fn with_footer_icon(mut self, icon_url: Option<String>) -> Self {
        self.footer_icon_url = icon_url.filter(|url| !url.is_empty());
        self
    }

    pub fn maybe_from_config(config: &AppConfig, client: reqwest::Client) -> Option<Self> {
        config
            .discord_webhook_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| {
                Self::new(client, url.clone()).with_footer_icon(config.discord_footer_icon_url.clone())
            })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn render(&self, alert: &Alert) -> Value {
        let mut footer = json!({ "text": FOOTER_TEXT });
        if let Some(icon_url) = &self.footer_icon_url {
            footer["icon_url"] = json!(icon_url);
        }

        json!({
            "embeds": [{
                "title": EMBED_TITLE,
                "color": EMBED_COLOR,
                "fields": [
                    { "name": "Token", "value": alert.token, "inline": false },
                    { "name": "Amount", "value": format_amount(alert.amount), "inline": true },
                    { "name": "USD Value", "value": format_usd(alert.usd_value), "inline": true },
                    { "name": "From", "value": alert.source, "inline": false },
                    { "name": "To", "value": alert.destination, "inline": false },
                    { "name": "Transaction", "value": format!("[View on Solscan]({})", alert.tx_link), "inline": false }
                ],
                "timestamp": alert.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                "footer": footer
            }]
        })
    }
}

#[async_trait]
impl Notify for DiscordNotifier {
    async fn notify(&self, alert: &Alert) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.render(alert))
            .send()
            .await
            .map_err(|e| WhaleError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            info!("Alert sent to Discord: {}", alert.tx_link);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Failed to send Discord alert ({}): {}", status, error_text);
            Err(WhaleError::Delivery(format!("Discord returned {status}")))
        }
    }
}
