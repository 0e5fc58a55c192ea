use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WhaleError};

/// Body of an inbound enhanced-transaction webhook. Only the fields the
/// alert pipeline reads are modelled; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub events: Option<WebhookEvents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvents {
    /// Kept as raw values so one malformed transfer cannot reject the batch.
    #[serde(default)]
    pub token_transfers: Option<Vec<serde_json::Value>>,
}

impl WebhookPayload {
    /// An empty body is an empty batch, not a malformed one.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| WhaleError::PayloadParse(e.to_string()))
    }

    pub fn token_transfers(&self) -> &[serde_json::Value] {
        self.events
            .as_ref()
            .and_then(|events| events.token_transfers.as_deref())
            .unwrap_or(&[])
    }

    pub fn signature(&self) -> &str {
        self.signature.as_deref().unwrap_or_default()
    }
}

/// Upstream providers send the amount either as a decimal string or a bare number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenAmount {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    #[serde(default)]
    pub token_amount: Option<TokenAmount>,
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
}

impl TransferEvent {
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| WhaleError::Valuation(format!("bad transfer: {e}")))
    }

    pub fn amount(&self) -> Result<f64> {
        let amount = match &self.token_amount {
            Some(TokenAmount::Number(n)) => *n,
            Some(TokenAmount::Text(raw)) => raw.trim().parse::<f64>().map_err(|_| {
                WhaleError::Valuation(format!("tokenAmount {raw:?} is not a number"))
            })?,
            None => return Err(WhaleError::Valuation("tokenAmount missing".to_string())),
        };

        if amount.is_finite() {
            Ok(amount)
        } else {
            Err(WhaleError::Valuation(format!("tokenAmount {amount} is not finite")))
        }
    }
}

/// A persisted whale alert. Field names match the published `alerts.json` feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub token: String,
    pub amount: f64,
    pub usd_value: f64,
    pub source: String,
    pub destination: String,
    pub tx_link: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        transfer: &TransferEvent,
        amount: f64,
        usd_value: f64,
        tx_link: impl Into<String>,
    ) -> Self {
        Self {
            token: transfer.mint.clone(),
            amount,
            usd_value,
            source: transfer.source.clone(),
            destination: transfer.destination.clone(),
            tx_link: tx_link.into(),
            timestamp: Utc::now().trunc_subsecs(3),
        }
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn missing_events_means_no_transfers() {
        let payload = WebhookPayload::parse(br#"{"signature":"abc"}"#).unwrap();
        assert!(payload.token_transfers().is_empty());
        assert_eq!(payload.signature(), "abc");

        let payload = WebhookPayload::parse(br#"{"events":{"tokenTransfers":null}}"#).unwrap();
        assert!(payload.token_transfers().is_empty());
        assert_eq!(payload.signature(), "");
    }

    #[test]
    fn empty_body_is_an_empty_batch() {
        for body in [&b""[..], &b"  \r\n"[..]] {
            let payload = WebhookPayload::parse(body).unwrap();
            assert!(payload.token_transfers().is_empty());
        }
    }

    #[test]
    fn rejects_malformed_body() {
        let err = WebhookPayload::parse(b"{not json").unwrap_err();
        assert!(matches!(err, WhaleError::PayloadParse(_)));

        let err = WebhookPayload::parse(br#"{"events":{"tokenTransfers":"nope"}}"#).unwrap_err();
        assert!(matches!(err, WhaleError::PayloadParse(_)));
    }

    #[test]
    fn parses_string_and_numeric_amounts() {
        let text = TransferEvent::from_value(&json!({"tokenAmount": " 1500.25 ", "mint": "m"})).unwrap();
        assert_eq!(text.amount().unwrap(), 1500.25);

        let number = TransferEvent::from_value(&json!({"tokenAmount": 42, "mint": "m"})).unwrap();
        assert_eq!(number.amount().unwrap(), 42.0);
    }

    #[test]
    fn bad_amounts_are_valuation_errors() {
        for value in [json!({"tokenAmount": "lots"}), json!({"mint": "m"}), json!({"tokenAmount": "inf"})] {
            let transfer = TransferEvent::from_value(&value).unwrap();
            assert!(matches!(transfer.amount(), Err(WhaleError::Valuation(_))));
        }
    }

    #[test]
    fn alert_serializes_with_feed_field_names() {
        let alert = Alert {
            token: "So11111111111111111111111111111111111111112".to_string(),
            amount: 2_000_000_000.0,
            usd_value: 100_000_000.0,
            source: "from".to_string(),
            destination: "to".to_string(),
            tx_link: "https://solscan.io/tx/sig".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        };

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["usdValue"], json!(100_000_000.0));
        assert_eq!(value["txLink"], json!("https://solscan.io/tx/sig"));
        assert_eq!(value["timestamp"], json!("2024-05-01T12:30:00.000Z"));

        let back: Alert = serde_json::from_value(value).unwrap();
        assert_eq!(back, alert);
    }
}
