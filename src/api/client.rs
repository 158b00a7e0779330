use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::models::{FutureQuote, FuturesSnapshot, StockQuote, Ticker, WatchlistSelector, WatchlistSnapshot};
use super::MarketDataRepository;
use crate::resource::{fetch_stream, Resource};

/// HTTP client for the market data API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FuturesResponse {
    contracts: Vec<FutureQuote>,
}

#[derive(Debug, Deserialize)]
struct WatchlistResponse {
    tickers: Vec<Ticker>,
}

impl ApiClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?
            .error_for_status()
            .with_context(|| format!("{} request was rejected", what))?;

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;

        Ok(body)
    }

    pub async fn fetch_futures(&self) -> Result<FuturesSnapshot> {
        let response: FuturesResponse = self.get_json("/api/v1/futures", "futures").await?;

        Ok(FuturesSnapshot {
            fetched_at: Utc::now(),
            contracts: response.contracts,
        })
    }

    pub async fn fetch_watchlist(&self, selector: WatchlistSelector) -> Result<WatchlistSnapshot> {
        let path = format!("/api/v1/watchlists/{}", selector.slug());
        let response: WatchlistResponse = self.get_json(&path, "watchlist").await?;

        Ok(WatchlistSnapshot {
            selector,
            fetched_at: Utc::now(),
            tickers: response.tickers,
        })
    }
}

#[async_trait]
impl MarketDataRepository for ApiClient {
    fn get_futures_data(&self) -> BoxStream<'static, Resource<FuturesSnapshot>> {
        let client = self.clone();
        fetch_stream(async move { client.fetch_futures().await })
    }

    fn get_watchlist(
        &self,
        selector: WatchlistSelector,
    ) -> BoxStream<'static, Resource<WatchlistSnapshot>> {
        let client = self.clone();
        fetch_stream(async move { client.fetch_watchlist(selector).await })
    }

    async fn get_stock_quote(&self, ticker: &str) -> Result<StockQuote> {
        let path = format!("/api/v1/quotes/{}", ticker);
        self.get_json(&path, "quote").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/".to_string(), 5).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_watchlist_response_shape() {
        let body = r#"{"tickers":[{"ticker":"NVDA","last_price":880.1,"change_dollar":12.4,
            "change_percent":1.43,"volume":51000000,"volume_thirty_day_avg":47000000,
            "market_cap":2200000000000}]}"#;
        let parsed: WatchlistResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.tickers.len(), 1);
        assert_eq!(parsed.tickers[0].ticker, "NVDA");
    }

    #[tokio::test]
    async fn test_unreachable_server_yields_error_resource() {
        use futures::StreamExt;

        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let client = ApiClient::new("http://127.0.0.1:9".to_string(), 1).unwrap();
        let items: Vec<_> = client.get_futures_data().collect().await;

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Resource::Loading));
        assert!(matches!(items[1], Resource::Error(_)));
    }
}
