//! Configuration loading and validation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::FetcherConfig;
use crate::models::{ColumnMap, Measure, Mode};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Published CSV export URL of the sheet
    #[serde(default)]
    pub url: String,

    /// How long a fetched sheet is reused, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Largest accepted export, in bytes
    #[serde(default = "default_max_content_size")]
    pub max_content_size: usize,
}

fn default_cache_ttl() -> u64 {
    5
}

fn default_timeout() -> u64 {
    30
}

fn default_max_content_size() -> usize {
    10 * 1024 * 1024
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            cache_ttl_seconds: default_cache_ttl(),
            timeout_seconds: default_timeout(),
            max_content_size: default_max_content_size(),
        }
    }
}

/// What to read from the sheet and how to present it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Column family: "Total" or "Daily"
    #[serde(default)]
    pub mode: Mode,

    /// Page heading
    #[serde(default = "default_title")]
    pub title: String,

    /// Minutes between automatic refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,

    #[serde(default = "default_entity_column")]
    pub entity_column: String,

    #[serde(default = "default_function_column")]
    pub function_column: String,

    /// Per-measure header overrides, e.g. `mous = "Signed MoUs"`
    #[serde(default)]
    pub columns: BTreeMap<Measure, String>,
}

fn default_title() -> String {
    "Leaderboard".to_string()
}

/// One week.
const MAX_REFRESH_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn default_refresh_interval() -> u64 {
    1
}

fn default_entity_column() -> String {
    "Entity".to_string()
}

fn default_function_column() -> String {
    "Function".to_string()
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            title: default_title(),
            refresh_interval_minutes: default_refresh_interval(),
            entity_column: default_entity_column(),
            function_column: default_function_column(),
            columns: BTreeMap::new(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            source: SourceConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating, so command-line overrides can
    /// fill in missing values first.
    pub fn read_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source.url must be set to the sheet's CSV export URL".to_string(),
            ));
        }

        FetcherConfig::parse_url(&self.source.url)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Source timeout must be greater than 0".to_string(),
            ));
        }

        if self.leaderboard.refresh_interval_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "Refresh interval must be at least 1 minute".to_string(),
            ));
        }

        if self.leaderboard.refresh_interval_minutes > MAX_REFRESH_INTERVAL_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "Refresh interval must be at most {} minutes",
                MAX_REFRESH_INTERVAL_MINUTES
            )));
        }

        if self.leaderboard.entity_column.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Entity column name must not be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn column_map(&self) -> ColumnMap {
        let mut map = ColumnMap::for_mode(self.leaderboard.mode)
            .with_overrides(&self.leaderboard.columns);
        map.entity = self.leaderboard.entity_column.clone();
        map.function = self.leaderboard.function_column.clone();
        map
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.leaderboard.refresh_interval_minutes.saturating_mul(60))
    }

    pub fn fetcher_config(&self) -> Result<FetcherConfig, ConfigError> {
        let url = FetcherConfig::parse_url(&self.source.url)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(FetcherConfig {
            cache_ttl: Duration::from_secs(self.source.cache_ttl_seconds),
            max_content_size: self.source.max_content_size,
            timeout: Duration::from_secs(self.source.timeout_seconds),
            ..FetcherConfig::new(url)
        })
    }
}
