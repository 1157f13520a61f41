// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! Every field has a serde default so older or hand-edited files keep
//! loading, and the map API key can be supplied through the environment.

use std::time::Duration;

use farm_client::{ApiConfig, SyncConfig, ViewportStrategy};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "farm-map";
const CONFIG_NAME: &str = "config";

/// Environment variable that overrides the configured map API key.
pub const MAP_API_KEY_ENV: &str = "FARM_MAP_API_KEY";

/// Default API server
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the farm records API (scheme, host, optional prefix)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Maps API key used for map links (env var takes precedence)
    #[serde(default)]
    pub map_api_key: Option<String>,

    /// Marker refresh period in milliseconds; 0 or null disables polling
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: Option<u64>,

    /// Timeout for list and delete requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for image uploads
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Show newest records first
    #[serde(default = "default_true")]
    pub sort_by_timestamp: bool,

    /// Empty the marker list when a refresh fails
    #[serde(default)]
    pub clear_markers_on_error: bool,

    /// "centroid" or "fit_bounds"
    #[serde(default)]
    pub viewport_strategy: ViewportStrategy,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

#[allow(clippy::unnecessary_wraps, reason = "serde default for an Option field")]
fn default_poll_interval_ms() -> Option<u64> {
    Some(30_000)
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_upload_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            api_base_url: default_api_base_url(),
            map_api_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            sort_by_timestamp: true,
            clear_markers_on_error: false,
            viewport_strategy: ViewportStrategy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating the file with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Polling period, `None` when disabled
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Map API key from the environment or, failing that, the config file
    pub fn resolve_map_api_key(&self) -> Option<String> {
        resolve_map_api_key(
            std::env::var(MAP_API_KEY_ENV).ok().as_deref(),
            self.map_api_key.as_deref(),
        )
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            sort_by_timestamp: self.sort_by_timestamp,
            clear_on_error: self.clear_markers_on_error,
            viewport_strategy: self.viewport_strategy,
            ..Default::default()
        }
    }
}

fn resolve_map_api_key(env_key: Option<&str>, config_key: Option<&str>) -> Option<String> {
    env_key
        .filter(|k| !k.is_empty())
        .or_else(|| config_key.filter(|k| !k.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.sort_by_timestamp);
        assert!(!config.clear_markers_on_error);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_base_url": "https://farms.example.com"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://farms.example.com");
        assert_eq!(config.poll_interval_ms, Some(30_000));
        assert_eq!(config.upload_timeout_secs, 30);
        assert_eq!(config.viewport_strategy, ViewportStrategy::Centroid);
    }

    #[test]
    fn test_polling_disabled() {
        let config = AppConfig {
            poll_interval_ms: None,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), None);

        let zero = AppConfig {
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.poll_interval(), None);
    }

    #[test]
    fn test_viewport_strategy_names() {
        let config: AppConfig =
            serde_json::from_str(r#"{"viewport_strategy": "fit_bounds"}"#).unwrap();
        assert_eq!(config.viewport_strategy, ViewportStrategy::FitBounds);
    }

    #[test]
    fn test_env_key_takes_precedence() {
        assert_eq!(
            resolve_map_api_key(Some("env-key"), Some("file-key")).as_deref(),
            Some("env-key")
        );
        assert_eq!(
            resolve_map_api_key(Some(""), Some("file-key")).as_deref(),
            Some("file-key")
        );
        assert_eq!(resolve_map_api_key(None, Some("")), None);
    }

    #[test]
    fn test_client_configs() {
        let config = AppConfig {
            request_timeout_secs: 5,
            clear_markers_on_error: true,
            ..Default::default()
        };
        assert_eq!(config.api_config().request_timeout, Duration::from_secs(5));
        assert!(config.sync_config().clear_on_error);
    }
}
