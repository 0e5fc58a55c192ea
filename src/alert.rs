use crate::domain::{Alert, TransferEvent};

#[derive(Debug, Clone)]
pub struct AlertEngine {
    threshold: f64,
    explorer_tx_url: String,
}

impl AlertEngine {
    pub fn new(threshold: f64, explorer_tx_url: impl Into<String>) -> Self {
        Self {
            threshold,
            explorer_tx_url: explorer_tx_url.into(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The threshold is inclusive: a transfer worth exactly the threshold alerts.
    pub fn should_alert(
        &self,
        transfer: &TransferEvent,
        amount: f64,
        usd_value: f64,
        signature: &str,
    ) -> Option<Alert> {
        if usd_value >= self.threshold {
            Some(Alert::new(transfer, amount, usd_value, self.tx_link(signature)))
        } else {
            None
        }
    }

    pub fn tx_link(&self, signature: &str) -> String {
        format!("{}{}", self.explorer_tx_url, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::AlertEngine;
    use crate::domain::TransferEvent;

    fn transfer() -> TransferEvent {
        TransferEvent {
            token_amount: None,
            mint: "So11111111111111111111111111111111111111112".to_string(),
            source: "FromWallet111".to_string(),
            destination: "ToWallet222".to_string(),
        }
    }

    fn engine() -> AlertEngine {
        AlertEngine::new(50_000_000.0, "https://solscan.io/tx/")
    }

    #[test]
    fn triggers_above_threshold() {
        let alert = engine()
            .should_alert(&transfer(), 2_000_000_000.0, 100_000_000.0, "5sig")
            .expect("alert");

        assert_eq!(alert.token, "So11111111111111111111111111111111111111112");
        assert_eq!(alert.amount, 2_000_000_000.0);
        assert_eq!(alert.usd_value, 100_000_000.0);
        assert_eq!(alert.source, "FromWallet111");
        assert_eq!(alert.destination, "ToWallet222");
        assert_eq!(alert.tx_link, "https://solscan.io/tx/5sig");
    }

    #[test]
    fn ignores_below_threshold() {
        assert!(engine()
            .should_alert(&transfer(), 1_000_000.0, 50_000.0, "5sig")
            .is_none());
    }

    #[test]
    fn triggers_exactly_at_threshold() {
        let engine = engine();
        assert!(engine
            .should_alert(&transfer(), 1_000_000_000.0, engine.threshold(), "5sig")
            .is_some());
    }

    #[test]
    fn nan_never_alerts() {
        assert!(engine()
            .should_alert(&transfer(), f64::NAN, f64::NAN, "5sig")
            .is_none());
    }
}
