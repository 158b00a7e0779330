//! Dashboard state coordinator.
//!
//! Owns the observable slots the dashboard renders from, the two refresh
//! loops that feed them, and every write to the persisted user watchlist.
//! Each slot has at most one writer at a time: the futures loop, the
//! current watchlist loop, or the serialized settings mutations.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{FuturesSnapshot, MarketDataRepository, WatchlistSelector, WatchlistSnapshot};
use crate::errors::DashboardError;
use crate::refresh::RefreshTask;
use crate::resource::Resource;
use crate::slot::ObservableSlot;
use crate::store::{AppPreferences, PreferencesStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    pub refresh_interval: Duration,
    /// Watchlist to poll first; overrides the stored default when set.
    pub initial_watchlist: Option<WatchlistSelector>,
}

impl DashboardConfig {
    pub fn from_preferences(preferences: &AppPreferences) -> Self {
        Self {
            refresh_interval: Duration::from_secs(preferences.refresh_interval_secs.max(1)),
            initial_watchlist: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Duplicate,
}

pub struct DashboardCoordinator {
    repo: Arc<dyn MarketDataRepository>,
    store: Arc<dyn PreferencesStore>,
    config: DashboardConfig,
    root: CancellationToken,

    futures: Arc<ObservableSlot<FuturesSnapshot>>,
    watchlist: Arc<ObservableSlot<WatchlistSnapshot>>,
    user_watchlist: ObservableSlot<Vec<String>>,
    preferences: ObservableSlot<AppPreferences>,
    active: watch::Sender<WatchlistSelector>,

    futures_task: Mutex<Option<RefreshTask>>,
    watchlist_task: Mutex<Option<RefreshTask>>,
    /// Serializes read-modify-write of the persisted user watchlist.
    settings_lock: Mutex<()>,
}

impl DashboardCoordinator {
    pub fn new(
        repo: Arc<dyn MarketDataRepository>,
        store: Arc<dyn PreferencesStore>,
        config: DashboardConfig,
    ) -> Self {
        let (active, _rx) = watch::channel(WatchlistSelector::default());

        Self {
            repo,
            store,
            config,
            root: CancellationToken::new(),
            futures: Arc::new(ObservableSlot::new()),
            watchlist: Arc::new(ObservableSlot::new()),
            user_watchlist: ObservableSlot::new(),
            preferences: ObservableSlot::new(),
            active,
            futures_task: Mutex::new(None),
            watchlist_task: Mutex::new(None),
            settings_lock: Mutex::new(()),
        }
    }

    /// Load preferences and the user watchlist once and start both refresh loops.
    ///
    /// The loops are started even when a load fails; the first load error is
    /// returned after everything has been attempted.
    pub async fn initialize(&self) -> Result<(), DashboardError> {
        let preferences = self.load_preferences().await;
        let selector = match (self.config.initial_watchlist, &preferences) {
            (Some(selector), _) => selector,
            (None, Ok(prefs)) => prefs.default_watchlist,
            (None, Err(_)) => self.active_watchlist(),
        };

        self.start_futures_updater().await;
        self.change_active_watchlist(selector).await;
        let user_watchlist = self.load_user_watchlist().await;

        info!(
            event = "dashboard.initialized",
            watchlist = selector.slug(),
            interval_secs = self.config.refresh_interval.as_secs()
        );

        preferences?;
        user_watchlist?;
        Ok(())
    }

    async fn load_preferences(&self) -> Result<AppPreferences, DashboardError> {
        match self.store.get_preferences().await {
            Ok(prefs) => {
                debug!(event = "dashboard.preferences_loaded", preferences = ?prefs);
                self.preferences.set(prefs.clone());
                Ok(prefs)
            }
            Err(e) => {
                warn!(event = "dashboard.preferences_load_failed", error = %e);
                Err(e.into())
            }
        }
    }

    /// Write the currently loaded preferences back to the store.
    pub async fn save_preferences(&self) -> Result<(), DashboardError> {
        let Some(prefs) = self.preferences.get() else {
            debug!(event = "dashboard.preferences_save_skipped");
            return Ok(());
        };
        self.store.save_preferences(&prefs).await?;
        info!(event = "dashboard.preferences_saved");
        Ok(())
    }

    async fn start_futures_updater(&self) {
        let mut current = self.futures_task.lock().await;
        if let Some(task) = current.take() {
            task.cancel_and_join().await;
        }

        let repo = self.repo.clone();
        let slot = self.futures.clone();
        *current = Some(RefreshTask::spawn(
            "futures",
            self.config.refresh_interval,
            &self.root,
            move || publish_latest(repo.get_futures_data(), slot.clone(), "futures"),
        ));
    }

    /// Switch the polled remote watchlist.
    ///
    /// The previous loop is cancelled and fully joined before the new one
    /// starts, so the watchlist slot never has two writers. Passing the
    /// already active selector restarts its loop.
    pub async fn change_active_watchlist(&self, selector: WatchlistSelector) {
        let mut current = self.watchlist_task.lock().await;
        if let Some(task) = current.take() {
            task.cancel_and_join().await;
        }

        let previous = self.active.send_replace(selector);

        let repo = self.repo.clone();
        let slot = self.watchlist.clone();
        *current = Some(RefreshTask::spawn(
            format!("watchlist:{}", selector.slug()),
            self.config.refresh_interval,
            &self.root,
            move || publish_latest(repo.get_watchlist(selector), slot.clone(), "watchlist"),
        ));

        info!(
            event = "dashboard.watchlist_changed",
            from = previous.slug(),
            to = selector.slug()
        );
    }

    pub fn active_watchlist(&self) -> WatchlistSelector {
        *self.active.borrow()
    }

    /// One-shot read of the persisted user watchlist into its slot.
    pub async fn load_user_watchlist(&self) -> Result<Vec<String>, DashboardError> {
        let _guard = self.settings_lock.lock().await;
        let settings = self.store.get_user_settings().await?;
        self.user_watchlist.set(settings.current_watchlist.clone());
        debug!(
            event = "dashboard.user_watchlist_loaded",
            count = settings.current_watchlist.len()
        );
        Ok(settings.current_watchlist)
    }

    /// Append `symbol` to the user watchlist unless it is already there.
    ///
    /// On a duplicate nothing is written and `on_duplicate` runs exactly once.
    pub async fn add_ticker<F>(&self, symbol: &str, on_duplicate: F) -> Result<AddOutcome, DashboardError>
    where
        F: FnOnce(),
    {
        let symbol = normalize_symbol(symbol)?;

        let guard = self.settings_lock.lock().await;
        let mut settings = self.store.get_user_settings().await?;

        if settings
            .current_watchlist
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&symbol))
        {
            drop(guard);
            info!(event = "dashboard.ticker_duplicate", ticker = %symbol);
            on_duplicate();
            return Ok(AddOutcome::Duplicate);
        }

        settings.current_watchlist.push(symbol.clone());
        self.store.update_user_settings(&settings).await?;
        self.user_watchlist.set(settings.current_watchlist);

        info!(event = "dashboard.ticker_added", ticker = %symbol);
        Ok(AddOutcome::Added)
    }

    /// Remove `symbol` from the user watchlist. Returns whether anything changed.
    ///
    /// A blank symbol can never be on the list, so it is a no-op like any
    /// other absent symbol.
    pub async fn remove_ticker(&self, symbol: &str) -> Result<bool, DashboardError> {
        let Ok(symbol) = normalize_symbol(symbol) else {
            debug!(event = "dashboard.ticker_not_found", ticker = %symbol);
            return Ok(false);
        };

        let _guard = self.settings_lock.lock().await;
        let mut settings = self.store.get_user_settings().await?;

        let Some(index) = settings
            .current_watchlist
            .iter()
            .position(|existing| existing.eq_ignore_ascii_case(&symbol))
        else {
            debug!(event = "dashboard.ticker_not_found", ticker = %symbol);
            return Ok(false);
        };

        settings.current_watchlist.remove(index);
        self.store.update_user_settings(&settings).await?;
        self.user_watchlist.set(settings.current_watchlist);

        info!(event = "dashboard.ticker_removed", ticker = %symbol);
        Ok(true)
    }

    pub fn futures(&self) -> watch::Receiver<Option<FuturesSnapshot>> {
        self.futures.subscribe()
    }

    pub fn watchlist(&self) -> watch::Receiver<Option<WatchlistSnapshot>> {
        self.watchlist.subscribe()
    }

    pub fn user_watchlist(&self) -> watch::Receiver<Option<Vec<String>>> {
        self.user_watchlist.subscribe()
    }

    pub fn preferences(&self) -> watch::Receiver<Option<AppPreferences>> {
        self.preferences.subscribe()
    }

    /// Cancel both refresh loops and wait for them to exit.
    pub async fn shutdown(&self) {
        self.root.cancel();

        if let Some(task) = self.futures_task.lock().await.take() {
            task.cancel_and_join().await;
        }
        if let Some(task) = self.watchlist_task.lock().await.take() {
            task.cancel_and_join().await;
        }

        info!(event = "dashboard.shutdown_completed");
    }
}

impl Drop for DashboardCoordinator {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Trim and upper-case a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> Result<String, DashboardError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(DashboardError::EmptySymbol);
    }
    Ok(symbol.to_ascii_uppercase())
}

/// Drain one repository stream, publishing every `Success` into `slot`.
///
/// A stream that ends without a `Success` counts as a failed cycle.
async fn publish_latest<T: Clone>(
    mut stream: BoxStream<'static, Resource<T>>,
    slot: Arc<ObservableSlot<T>>,
    what: &'static str,
) -> anyhow::Result<()> {
    let mut collected = false;
    let mut last_error = None;

    while let Some(item) = stream.next().await {
        match item {
            Resource::Loading => {
                debug!(event = "dashboard.fetch_loading", source = what);
            }
            Resource::Success(data) => {
                slot.set(data);
                collected = true;
                debug!(event = "dashboard.fetch_collected", source = what);
            }
            Resource::Error(message) => {
                warn!(event = "dashboard.fetch_error", source = what, error = %message);
                last_error = Some(message);
            }
        }
    }

    if collected {
        Ok(())
    } else {
        match last_error {
            Some(message) => anyhow::bail!("{} fetch failed: {}", what, message),
            None => anyhow::bail!("{} fetch returned no data", what),
        }
    }
}
