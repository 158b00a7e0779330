//! In-memory collaborators for coordinator tests.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{
    FutureQuote, FuturesSnapshot, MarketDataRepository, StockQuote, Ticker, WatchlistSelector,
    WatchlistSnapshot,
};
use crate::errors::StoreError;
use crate::resource::{fetch_stream, Resource};
use crate::store::{AppPreferences, PreferencesStore, UserSettings};

pub(crate) struct FakeRepository {
    pub futures_calls: AtomicU64,
    pub watchlist_calls: Mutex<Vec<WatchlistSelector>>,
    pub fail_futures: AtomicBool,
    pub fail_watchlist: AtomicBool,
    pub fetch_delay: Duration,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(fetch_delay: Duration) -> Self {
        Self {
            futures_calls: AtomicU64::new(0),
            watchlist_calls: Mutex::new(Vec::new()),
            fail_futures: AtomicBool::new(false),
            fail_watchlist: AtomicBool::new(false),
            fetch_delay,
        }
    }

    pub fn watchlist_calls_for(&self, selector: WatchlistSelector) -> usize {
        self.watchlist_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == selector)
            .count()
    }
}

pub(crate) fn sample_ticker(symbol: &str) -> Ticker {
    Ticker {
        ticker: symbol.to_string(),
        last_price: 100.0,
        change_dollar: 1.0,
        change_percent: 1.0,
        volume: 2_000_000,
        volume_thirty_day_avg: 1_000_000,
        market_cap: 50_000_000_000,
    }
}

#[async_trait]
impl MarketDataRepository for FakeRepository {
    fn get_futures_data(&self) -> BoxStream<'static, Resource<FuturesSnapshot>> {
        let call = self.futures_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = self.fail_futures.load(Ordering::SeqCst);
        let delay = self.fetch_delay;

        fetch_stream(async move {
            tokio::time::sleep(delay).await;
            if fail {
                anyhow::bail!("futures feed unavailable");
            }
            Ok(FuturesSnapshot {
                fetched_at: Utc::now(),
                contracts: vec![FutureQuote {
                    name: "S&P 500".to_string(),
                    symbol: "ES=F".to_string(),
                    last_price: 5000.0 + call as f64,
                    change_dollar: 10.0,
                    change_percent: 0.2,
                }],
            })
        })
    }

    fn get_watchlist(
        &self,
        selector: WatchlistSelector,
    ) -> BoxStream<'static, Resource<WatchlistSnapshot>> {
        self.watchlist_calls.lock().unwrap().push(selector);
        let fail = self.fail_watchlist.load(Ordering::SeqCst);
        let delay = self.fetch_delay;

        fetch_stream(async move {
            tokio::time::sleep(delay).await;
            if fail {
                anyhow::bail!("watchlist feed unavailable");
            }
            Ok(WatchlistSnapshot {
                selector,
                fetched_at: Utc::now(),
                tickers: vec![sample_ticker(selector.slug())],
            })
        })
    }

    async fn get_stock_quote(&self, ticker: &str) -> anyhow::Result<StockQuote> {
        anyhow::bail!("no quote for {}", ticker)
    }
}

pub(crate) struct MemoryStore {
    preferences: tokio::sync::Mutex<AppPreferences>,
    settings: tokio::sync::Mutex<UserSettings>,
    pub fail_preferences: AtomicBool,
    pub settings_writes: AtomicU64,
}

impl MemoryStore {
    pub fn with_watchlist(symbols: &[&str]) -> Self {
        Self {
            preferences: tokio::sync::Mutex::new(AppPreferences::default()),
            settings: tokio::sync::Mutex::new(UserSettings {
                current_watchlist: symbols.iter().map(|s| s.to_string()).collect(),
            }),
            fail_preferences: AtomicBool::new(false),
            settings_writes: AtomicU64::new(0),
        }
    }

    pub async fn set_preferences(&self, preferences: AppPreferences) {
        *self.preferences.lock().await = preferences;
    }

    pub async fn watchlist(&self) -> Vec<String> {
        self.settings.lock().await.current_watchlist.clone()
    }
}

#[async_trait]
impl PreferencesStore for MemoryStore {
    async fn get_preferences(&self) -> Result<AppPreferences, StoreError> {
        if self.fail_preferences.load(Ordering::SeqCst) {
            return Err(StoreError::Read {
                path: "memory://preferences".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "store offline"),
            });
        }
        Ok(self.preferences.lock().await.clone())
    }

    async fn save_preferences(&self, preferences: &AppPreferences) -> Result<(), StoreError> {
        *self.preferences.lock().await = preferences.clone();
        Ok(())
    }

    async fn get_user_settings(&self) -> Result<UserSettings, StoreError> {
        let settings = self.settings.lock().await.clone();
        // Give concurrent writers a chance to interleave between read and write.
        tokio::task::yield_now().await;
        Ok(settings)
    }

    async fn update_user_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        *self.settings.lock().await = settings.clone();
        self.settings_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
