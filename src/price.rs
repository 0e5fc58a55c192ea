use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{Result, WhaleError};
use crate::token_registry::TokenRegistry;

/// USD unit prices keyed by price-source identifier (`solana`, `usd-coin`, ...).
pub type Prices = HashMap<String, f64>;

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, price_ids: &[String]) -> Result<Prices>;
}

pub struct CoinGeckoPriceSource {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoPriceSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn fetch_prices(&self, price_ids: &[String]) -> Result<Prices> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("ids", price_ids.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await
            .map_err(|e| WhaleError::PriceFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WhaleError::PriceFetch(format!("price API returned {status}")));
        }

        // Response shape: {"solana": {"usd": 142.1}, "usd-coin": {"usd": 1.0}}
        let json = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| WhaleError::PriceFetch(format!("unreadable price response: {e}")))?;
        let quotes = json
            .as_object()
            .ok_or_else(|| WhaleError::PriceFetch("price response is not an object".into()))?;

        let prices: Prices = quotes
            .iter()
            .filter_map(|(id, quote)| {
                quote
                    .get("usd")
                    .and_then(|usd| usd.as_f64())
                    .filter(|usd| usd.is_finite() && *usd >= 0.0)
                    .map(|usd| (id.clone(), usd))
            })
            .collect();

        if !price_ids.iter().any(|id| prices.contains_key(id)) {
            return Err(WhaleError::PriceFetch(
                "price response has no usd quote for any requested asset".into(),
            ));
        }

        Ok(prices)
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    prices: Prices,
    refreshed_at: Option<Instant>,
}

/// Process-wide cache of asset prices.
///
/// Readers always get a complete snapshot immediately. When the snapshot is
/// older than the TTL the first caller refreshes it; callers arriving while
/// that refresh is in flight get the previous snapshot instead of waiting.
/// A failed refresh leaves both the prices and the refresh time untouched,
/// so the next call retries.
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    price_ids: Vec<String>,
    ttl: Duration,
    fetch_timeout: Duration,
    snapshot: RwLock<Snapshot>,
    refresh: Mutex<()>,
}

impl PriceCache {
    pub fn new(
        registry: &TokenRegistry,
        source: Arc<dyn PriceSource>,
        ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        let defaults = registry
            .tokens()
            .iter()
            .map(|token| (token.price_id.clone(), token.role.fallback_price()))
            .collect();

        Self {
            source,
            price_ids: registry.price_ids().into_iter().map(str::to_string).collect(),
            ttl,
            fetch_timeout,
            snapshot: RwLock::new(Snapshot {
                prices: defaults,
                refreshed_at: None,
            }),
            refresh: Mutex::new(()),
        }
    }

    pub async fn get_prices(&self) -> Prices {
        if !self.is_stale().await {
            return self.current().await;
        }

        let Ok(_guard) = self.refresh.try_lock() else {
            debug!("Price refresh already in flight, serving cached prices");
            return self.current().await;
        };

        // Another caller may have finished a refresh between the check and the lock.
        if self.is_stale().await {
            match self.fetch().await {
                Ok(prices) => {
                    info!("✅ Fetched prices: {:?}", prices);
                    let mut snapshot = self.snapshot.write().await;
                    snapshot.prices = prices;
                    snapshot.refreshed_at = Some(Instant::now());
                }
                Err(e) => warn!("❌ Failed to fetch prices, keeping cached values: {}", e),
            }
        }

        self.current().await
    }

    async fn fetch(&self) -> Result<Prices> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch_prices(&self.price_ids)).await {
            Ok(result) => result,
            Err(_) => Err(WhaleError::PriceFetch(format!(
                "price source timed out after {:?}",
                self.fetch_timeout
            ))),
        }
    }

    async fn is_stale(&self) -> bool {
        match self.snapshot.read().await.refreshed_at {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    async fn current(&self) -> Prices {
        self.snapshot.read().await.prices.clone()
    }
}
