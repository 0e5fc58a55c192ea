use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, WhaleError};
use crate::token_registry::{AssetRole, TokenInfo, TokenRegistry};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_THRESHOLD_USD: f64 = 50_000_000.0;
pub const DEFAULT_PRICE_TTL_SECS: u64 = 3600;
pub const DEFAULT_HISTORY_CAPACITY: usize = 15;
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://solscan.io/tx/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub discord_webhook_url: Option<String>,
    /// Image shown next to the embed footer text.
    pub discord_footer_icon_url: Option<String>,
    pub alert_threshold_usd: f64,
    pub price_ttl: Duration,
    pub price_api_url: String,
    pub http_timeout: Duration,
    pub native: TokenInfo,
    pub stable: TokenInfo,
    pub alert_file: PathBuf,
    pub history_capacity: usize,
    pub explorer_tx_url: String,
    pub allowed_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            discord_webhook_url: None,
            discord_footer_icon_url: None,
            alert_threshold_usd: DEFAULT_THRESHOLD_USD,
            price_ttl: Duration::from_secs(DEFAULT_PRICE_TTL_SECS),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            http_timeout: Duration::from_secs(10),
            native: TokenInfo::native_default(),
            stable: TokenInfo::stable_default(),
            alert_file: PathBuf::from("./alerts.json"),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            explorer_tx_url: DEFAULT_EXPLORER_TX_URL.to_string(),
            allowed_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let native = TokenInfo {
            role: AssetRole::Native,
            mint: get("NATIVE_MINT").unwrap_or(defaults.native.mint),
            price_id: get("NATIVE_PRICE_ID").unwrap_or(defaults.native.price_id),
            symbol: get("NATIVE_SYMBOL").unwrap_or(defaults.native.symbol),
        };
        let stable = TokenInfo {
            role: AssetRole::Stable,
            mint: get("STABLE_MINT").unwrap_or(defaults.stable.mint),
            price_id: get("STABLE_PRICE_ID").unwrap_or(defaults.stable.price_id),
            symbol: get("STABLE_SYMBOL").unwrap_or(defaults.stable.symbol),
        };

        let config = Self {
            port: parse_or("PORT", get("PORT"), defaults.port),
            discord_webhook_url: get("DISCORD_WEBHOOK_URL"),
            discord_footer_icon_url: get("DISCORD_FOOTER_ICON_URL"),
            alert_threshold_usd: parse_or(
                "ALERT_THRESHOLD_USD",
                get("ALERT_THRESHOLD_USD"),
                defaults.alert_threshold_usd,
            ),
            price_ttl: Duration::from_secs(parse_or(
                "PRICE_TTL_SECS",
                get("PRICE_TTL_SECS"),
                DEFAULT_PRICE_TTL_SECS,
            )),
            price_api_url: get("PRICE_API_URL").unwrap_or(defaults.price_api_url),
            http_timeout: Duration::from_secs(parse_or(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                defaults.http_timeout.as_secs(),
            )),
            native,
            stable,
            alert_file: get("ALERT_FILE").map(PathBuf::from).unwrap_or(defaults.alert_file),
            history_capacity: parse_or(
                "ALERT_HISTORY_CAPACITY",
                get("ALERT_HISTORY_CAPACITY"),
                defaults.history_capacity,
            ),
            explorer_tx_url: get("EXPLORER_TX_URL").unwrap_or(defaults.explorer_tx_url),
            allowed_origin: get("ALLOWED_ORIGIN"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(WhaleError::Config("ALERT_HISTORY_CAPACITY must be at least 1".into()));
        }
        if !(self.alert_threshold_usd.is_finite() && self.alert_threshold_usd > 0.0) {
            return Err(WhaleError::Config("ALERT_THRESHOLD_USD must be a positive number".into()));
        }
        if self.price_ttl.is_zero() {
            return Err(WhaleError::Config("PRICE_TTL_SECS must be positive".into()));
        }
        if self.http_timeout.is_zero() {
            return Err(WhaleError::Config("HTTP_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }

    pub fn token_registry(&self) -> TokenRegistry {
        TokenRegistry::new(vec![self.native.clone(), self.stable.clone()])
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
{
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️  {} has invalid value {:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
