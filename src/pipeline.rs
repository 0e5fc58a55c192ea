use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::alert::AlertEngine;
use crate::domain::{TransferEvent, WebhookPayload};
use crate::error::Result;
use crate::notifier::Notify;
use crate::price::{PriceCache, Prices};
use crate::store::AlertStore;
use crate::valuation::Valuator;

/// Per-call summary. The webhook caller only ever sees `OK`; this is for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub transfers: usize,
    pub alerts_saved: usize,
    pub notifications_sent: usize,
    pub failures: usize,
}

#[derive(Debug, Default)]
struct TransferOutcome {
    alerted: bool,
    saved: bool,
    notified: bool,
    failed: bool,
}

pub struct IngestPipeline {
    prices: Arc<PriceCache>,
    valuator: Valuator,
    engine: AlertEngine,
    store: Arc<AlertStore>,
    notifier: Arc<dyn Notify>,
}

impl IngestPipeline {
    pub fn new(
        prices: Arc<PriceCache>,
        valuator: Valuator,
        engine: AlertEngine,
        store: Arc<AlertStore>,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            prices,
            valuator,
            engine,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    /// Parses a raw webhook body and processes it. Only an unparseable body fails.
    pub async fn handle_body(&self, body: &[u8]) -> Result<Ack> {
        let payload = WebhookPayload::parse(body)?;
        self.handle_webhook(payload).await
    }

    pub async fn handle_webhook(&self, payload: WebhookPayload) -> Result<Ack> {
        let transfers = payload.token_transfers();
        let mut ack = Ack {
            transfers: transfers.len(),
            ..Ack::default()
        };
        if transfers.is_empty() {
            debug!("Webhook carried no token transfers");
            return Ok(ack);
        }

        let prices = self.prices.get_prices().await;
        let signature = payload.signature();

        for raw in transfers {
            let outcome = self.process_transfer(raw, signature, &prices).await;
            ack.alerts_saved += usize::from(outcome.saved);
            ack.notifications_sent += usize::from(outcome.notified);
            ack.failures += usize::from(outcome.failed);
            if outcome.alerted && outcome.saved && outcome.notified {
                info!("🐋 Whale Alert sent and saved.");
            }
        }

        Ok(ack)
    }

    async fn process_transfer(
        &self,
        raw: &serde_json::Value,
        signature: &str,
        prices: &Prices,
    ) -> TransferOutcome {
        let mut outcome = TransferOutcome::default();

        let (transfer, amount) = match TransferEvent::from_value(raw).and_then(|t| {
            let amount = t.amount()?;
            Ok((t, amount))
        }) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping transfer in {}: {}", signature, e);
                outcome.failed = true;
                return outcome;
            }
        };

        let usd_value = self.valuator.to_usd(amount, &transfer.mint, prices);
        let Some(alert) = self.engine.should_alert(&transfer, amount, usd_value, signature) else {
            debug!("{} {} worth ${:.2}, below threshold", amount, transfer.mint, usd_value);
            return outcome;
        };
        outcome.alerted = true;

        // History and notification fail independently; neither undoes the other.
        match self.store.save(&alert).await {
            Ok(()) => outcome.saved = true,
            Err(e) => {
                error!("Failed to save alert for {}: {}", alert.tx_link, e);
                outcome.failed = true;
            }
        }

        match self.notifier.notify(&alert).await {
            Ok(()) => outcome.notified = true,
            Err(e) => {
                warn!("Alert for {} not delivered: {}", alert.tx_link, e);
                outcome.failed = true;
            }
        }

        outcome
    }
}
