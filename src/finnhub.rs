use crate::models::{to_cents, Quote};
use crate::quotes::{QuoteError, QuoteSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Response structure for the Finnhub quote endpoint
#[derive(Deserialize, Clone)]
struct FinnhubQuote {
    c: f64, // Current price
}

// One HTTP client shared by every lookup
lazy_static::lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::new();
}

/// Quote source backed by the Finnhub REST API, with a per-symbol cache.
pub struct FinnhubClient {
    api_key: String,
    base_url: Url,
    ttl: Duration,
    cache: Mutex<HashMap<String, (Quote, Instant)>>,
}

impl FinnhubClient {
    /// `base_url` must end with a slash, e.g. `https://finnhub.io/api/v1/`.
    pub fn new(api_key: String, base_url: Url, ttl: Duration) -> Self {
        Self {
            api_key,
            base_url,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn endpoint(&self, path: &str, symbol: &str) -> Result<Url, QuoteError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .append_pair("symbol", symbol)
            .append_pair("token", &self.api_key);
        Ok(url)
    }

    async fn fetch_stock_price(&self, symbol: &str) -> Result<Option<f64>, QuoteError> {
        let response = CLIENT.get(self.endpoint("quote", symbol)?).send().await?;
        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status()));
        }

        // Finnhub answers unknown symbols with an all-zero quote
        let quote: FinnhubQuote = response.json().await?;
        if quote.c <= 0.0 {
            return Ok(None);
        }
        Ok(Some(quote.c))
    }

    async fn fetch_stock_name(&self, symbol: &str) -> Result<Option<String>, QuoteError> {
        let response = CLIENT
            .get(self.endpoint("stock/profile2", symbol)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status()));
        }
        let profile: serde_json::Value = response.json().await?;
        Ok(profile["name"]
            .as_str()
            .filter(|name| !name.is_empty())
            .map(str::to_string))
    }

    async fn cached(&self, symbol: &str) -> Option<Quote> {
        let cache = self.cache.lock().await;
        match cache.get(symbol) {
            Some((quote, fetched)) if fetched.elapsed() < self.ttl => Some(quote.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        if let Some(quote) = self.cached(symbol).await {
            return Ok(Some(quote));
        }

        let Some(price) = self.fetch_stock_price(symbol).await? else {
            tracing::debug!("Unknown symbol {}", symbol);
            return Ok(None);
        };
        let name = self
            .fetch_stock_name(symbol)
            .await?
            .unwrap_or_else(|| symbol.to_string());

        let quote = Quote {
            name,
            symbol: symbol.to_string(),
            price: to_cents(price),
        };
        self.cache
            .lock()
            .await
            .insert(symbol.to_string(), (quote.clone(), Instant::now()));

        Ok(Some(quote))
    }
}
