use tracing::warn;

use crate::error::{Result, WhaleError};
use crate::price::Prices;
use crate::token_registry::TokenRegistry;

#[derive(Debug, Clone, Default)]
pub struct Valuator {
    registry: TokenRegistry,
}

impl Valuator {
    pub fn new(registry: TokenRegistry) -> Self {
        Self { registry }
    }

    /// USD value of `amount` units of `mint`. Unknown mints, missing prices and
    /// nonsensical results all value at zero; this never fails the caller.
    pub fn to_usd(&self, amount: f64, mint: &str, prices: &Prices) -> f64 {
        match self.try_to_usd(amount, mint, prices) {
            Ok(usd) => usd,
            Err(e) => {
                warn!("Price conversion error for {}: {}", mint, e);
                0.0
            }
        }
    }

    fn try_to_usd(&self, amount: f64, mint: &str, prices: &Prices) -> Result<f64> {
        let Some(token) = self.registry.get_token_info(mint) else {
            return Ok(0.0);
        };
        let Some(price) = prices.get(&token.price_id) else {
            return Ok(0.0);
        };

        let usd = amount * price;
        if usd.is_finite() {
            Ok(usd)
        } else {
            Err(WhaleError::Valuation(format!(
                "{amount} {} at ${price} is not a finite USD value",
                token.symbol
            )))
        }
    }
}
