mod console;
mod discord;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::Alert;
use crate::error::Result;

#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Fans an alert out to the console and, when configured, Discord.
/// Only a failed remote delivery is reported back to the caller.
pub struct NotifierHub {
    console: ConsoleNotifier,
    discord: Option<DiscordNotifier>,
}

impl NotifierHub {
    pub fn new(console: ConsoleNotifier, discord: Option<DiscordNotifier>) -> Self {
        Self { console, discord }
    }

    pub fn has_remote(&self) -> bool {
        self.discord.is_some()
    }
}

#[async_trait]
impl Notify for NotifierHub {
    async fn notify(&self, alert: &Alert) -> Result<()> {
        self.console.notify(alert).await?;

        if let Some(discord) = &self.discord {
            if let Err(e) = discord.notify(alert).await {
                warn!("Discord notification failed: {}", e);
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhaleError;
    use chrono::Utc;
    use mockito::Server;
    use std::time::Duration;

    fn alert() -> Alert {
        Alert {
            token: "So11111111111111111111111111111111111111112".to_string(),
            amount: 2_000_000_000.0,
            usd_value: 100_000_000.0,
            source: "from".to_string(),
            destination: "to".to_string(),
            tx_link: "https://solscan.io/tx/sig".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn console_only_hub_always_succeeds() {
        let hub = NotifierHub::new(ConsoleNotifier::new(), None);
        assert!(!hub.has_remote());
        assert!(hub.notify(&alert()).await.is_ok());
    }

    #[tokio::test]
    async fn remote_failure_is_a_delivery_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/webhooks/1/token")
            .with_status(500)
            .create_async()
            .await;

        let discord = DiscordNotifier::new(
            reqwest::Client::new(),
            format!("{}/api/webhooks/1/token", server.url()),
        );
        let hub = NotifierHub::new(ConsoleNotifier::new(), Some(discord));

        let err = hub.notify(&alert()).await.unwrap_err();
        assert!(matches!(err, WhaleError::Delivery(_)));
    }

    #[tokio::test]
    async fn unreachable_remote_is_a_delivery_error() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let discord = DiscordNotifier::new(client, "http://127.0.0.1:1/api/webhooks/1/token");
        let hub = NotifierHub::new(ConsoleNotifier::new(), Some(discord));

        assert!(matches!(hub.notify(&alert()).await, Err(WhaleError::Delivery(_))));
    }
}
