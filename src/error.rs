use thiserror::Error;

#[derive(Debug, Error)]
pub enum WhaleError {
    #[error("price fetch failed: {0}")]
    PriceFetch(String),

    #[error("valuation failed: {0}")]
    Valuation(String),

    #[error("alert history I/O failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("alert history is not valid JSON: {0}")]
    StorageFormat(#[from] serde_json::Error),

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("malformed webhook payload: {0}")]
    PayloadParse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WhaleError {
    /// Storage failures come in two shapes (I/O and a corrupt file); callers
    /// that only care about the kind use this.
    pub fn is_storage(&self) -> bool {
        matches!(self, WhaleError::Storage(_) | WhaleError::StorageFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, WhaleError>;
