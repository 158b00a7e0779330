use std::path::PathBuf;
use std::time::Duration;

use crate::api::WatchlistSelector;
use crate::dashboard::DashboardConfig;
use crate::store::AppPreferences;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime settings resolved from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: PathBuf,
    /// Overrides the stored refresh interval when set.
    pub refresh_secs: Option<u64>,
    /// Overrides the stored default watchlist when set.
    pub watchlist: Option<WatchlistSelector>,
    pub timeout_secs: u64,
    pub json_logs: bool,
}

impl Config {
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sentinel")
    }

    /// Where the full-screen dashboard writes its logs.
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("sentinel.log")
    }

    pub fn dashboard_config(&self, preferences: &AppPreferences) -> DashboardConfig {
        let mut config = DashboardConfig::from_preferences(preferences);
        if let Some(secs) = self.refresh_secs {
            config.refresh_interval = Duration::from_secs(secs.max(1));
        }
        config.initial_watchlist = self.watchlist;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: Self::default_data_dir(),
            refresh_secs: None,
            watchlist: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            json_logs: false,
        }
    }
}
