use crate::models::Quote;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid quote URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Source of live stock prices.
///
/// `Ok(None)` means the symbol is unknown; `Err` means the source itself
/// could not be reached or answered badly.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError>;
}
