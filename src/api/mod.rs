pub mod client;
pub mod models;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::resource::Resource;

pub use client::ApiClient;
pub use models::{
    FutureQuote, FuturesSnapshot, StockQuote, Ticker, WatchlistSelector, WatchlistSnapshot,
};

/// Remote source of market data consumed by the dashboard.
///
/// Snapshot calls return a lazy stream of [`Resource`] states; only the
/// terminal `Success` of a stream is published by the caller.
#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    fn get_futures_data(&self) -> BoxStream<'static, Resource<FuturesSnapshot>>;

    fn get_watchlist(
        &self,
        selector: WatchlistSelector,
    ) -> BoxStream<'static, Resource<WatchlistSnapshot>>;

    async fn get_stock_quote(&self, ticker: &str) -> anyhow::Result<StockQuote>;
}
