//! Durable preferences and user watchlist storage.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::api::WatchlistSelector;
use crate::errors::StoreError;

const PREFERENCES_FILE: &str = "preferences.json";
const USER_SETTINGS_FILE: &str = "user_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default)]
    pub default_watchlist: WatchlistSelector,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub show_extended_quote: bool,
}

fn default_refresh_interval_secs() -> u64 {
    60
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            default_watchlist: WatchlistSelector::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
            show_extended_quote: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserSettings {
    /// Ordered ticker symbols; no duplicates.
    #[serde(default)]
    pub current_watchlist: Vec<String>,
}

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn get_preferences(&self) -> Result<AppPreferences, StoreError>;

    async fn save_preferences(&self, preferences: &AppPreferences) -> Result<(), StoreError>;

    async fn get_user_settings(&self) -> Result<UserSettings, StoreError>;

    async fn update_user_settings(&self, settings: &UserSettings) -> Result<(), StoreError>;
}

/// Stores each record as a JSON document under one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_or_default<T>(&self, file: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.dir.join(file);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(event = "store.read_missing", path = %path.display());
                return Ok(T::default());
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
    }

    /// Write via a sibling temp file and rename so readers never see a partial document.
    async fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Write {
                path: self.dir.clone(),
                source,
            })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(event = "store.write_completed", path = %path.display());
        Ok(())
    }
}

#[async_trait]
impl PreferencesStore for JsonFileStore {
    async fn get_preferences(&self) -> Result<AppPreferences, StoreError> {
        self.read_or_default(PREFERENCES_FILE).await
    }

    async fn save_preferences(&self, preferences: &AppPreferences) -> Result<(), StoreError> {
        self.write(PREFERENCES_FILE, preferences).await
    }

    async fn get_user_settings(&self) -> Result<UserSettings, StoreError> {
        self.read_or_default(USER_SETTINGS_FILE).await
    }

    async fn update_user_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        self.write(USER_SETTINGS_FILE, settings).await
    }
}
