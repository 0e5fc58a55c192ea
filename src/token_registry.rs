#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Native,
    Stable,
}

impl AssetRole {
    /// Price used until the first successful refresh.
    pub fn fallback_price(self) -> f64 {
        match self {
            AssetRole::Native => 0.0,
            AssetRole::Stable => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub role: AssetRole,
    /// On-chain mint address.
    pub mint: String,
    /// Identifier of the asset at the price source.
    pub price_id: String,
    pub symbol: String,
}

impl TokenInfo {
    pub fn native_default() -> Self {
        Self {
            role: AssetRole::Native,
            mint: "So11111111111111111111111111111111111111112".to_string(),
            price_id: "solana".to_string(),
            symbol: "SOL".to_string(),
        }
    }

    pub fn stable_default() -> Self {
        Self {
            role: AssetRole::Stable,
            mint: "BXXkv6zRCzUVtpKzLZqYU8djDNBm6JjHoBeX6xBKUWsp".to_string(),
            price_id: "usd-coin".to_string(),
            symbol: "USDC".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(vec![TokenInfo::native_default(), TokenInfo::stable_default()])
    }
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    /// Looks up a mint by containment rather than equality, so upstream
    /// decorations around the address (prefixes, suffixes) still match.
    pub fn get_token_info(&self, mint: &str) -> Option<&TokenInfo> {
        self.tokens
            .iter()
            .find(|token| !token.mint.is_empty() && mint.contains(token.mint.as_str()))
    }

    pub fn price_ids(&self) -> Vec<&str> {
        self.tokens.iter().map(|token| token.price_id.as_str()).collect()
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }
}
