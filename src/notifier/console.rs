use async_trait::async_trait;
use tracing::info;

use super::Notify;
use crate::domain::Alert;
use crate::error::Result;
use crate::utils::{format_amount, format_usd};

#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notify for ConsoleNotifier {
    async fn notify(&self, alert: &Alert) -> Result<()> {
        println!(
            "🐋 {} {} ({}) {} -> {} {}",
            format_amount(alert.amount),
            alert.token,
            format_usd(alert.usd_value),
            alert.source,
            alert.destination,
            alert.tx_link
        );
        info!("Alert sent to console: {}", alert.tx_link);
        Ok(())
    }
}
