pub mod alert;
pub mod config;
pub mod domain;
pub mod error;
pub mod notifier;
pub mod pipeline;
pub mod price;
pub mod server;
pub mod store;
pub mod token_registry;
pub mod utils;
pub mod valuation;

use std::sync::Arc;

use alert::AlertEngine;
use config::AppConfig;
use notifier::{ConsoleNotifier, DiscordNotifier, NotifierHub};
use pipeline::IngestPipeline;
use price::{CoinGeckoPriceSource, PriceCache};
use server::AppState;
use store::AlertStore;
use utils::mask_url;
use valuation::Valuator;

use anyhow::Result;
use tracing::info;

pub async fn run() -> Result<()> {
    let config = AppConfig::from_env()?;
    let http = reqwest::Client::builder().timeout(config.http_timeout).build()?;

    let registry = config.token_registry();
    for token in registry.tokens() {
        info!("   - {} {} (price id {})", token.symbol, token.mint, token.price_id);
    }
    let engine = AlertEngine::new(config.alert_threshold_usd, config.explorer_tx_url.clone());
    info!(
        "💵 Alert threshold {} with {}s price TTL",
        utils::format_usd(engine.threshold()),
        config.price_ttl.as_secs()
    );

    let price_source = CoinGeckoPriceSource::new(http.clone(), config.price_api_url.clone());
    let prices = PriceCache::new(
        &registry,
        Arc::new(price_source),
        config.price_ttl,
        config.http_timeout,
    );

    let store = AlertStore::new(&config.alert_file, config.history_capacity);
    info!(
        "🗄️  Alert history at {} (last {} alerts)",
        store.path().display(),
        store.capacity()
    );

    let discord = DiscordNotifier::maybe_from_config(&config, http);
    if let Some(discord) = &discord {
        info!("📣 Discord notifications enabled: {}", mask_url(discord.webhook_url()));
    }
    let notifier = NotifierHub::new(ConsoleNotifier::new(), discord);
    if !notifier.has_remote() {
        info!("📣 Discord notifications disabled (no DISCORD_WEBHOOK_URL), alerts go to the console only");
    }

    let pipeline = IngestPipeline::new(
        Arc::new(prices),
        Valuator::new(registry),
        engine,
        Arc::new(store),
        Arc::new(notifier),
    );

    let listener = server::bind(config.port).await?;
    server::serve(
        listener,
        AppState {
            pipeline: Arc::new(pipeline),
        },
        config.allowed_origin.as_deref(),
    )
    .await
}
