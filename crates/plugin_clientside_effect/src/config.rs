//! Configuration management for the clientside effect plugin.
//!
//! Settings are loaded from a TOML file. Every field has a default so a
//! partial file (or none at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Published effect map of the client release the plugin was built against.
pub const DEFAULT_EFFECT_MAP_URL: &str =
    "https://images.habbo.com/gordon/PRODUCTION-202107011209-606458337/effectmap.xml";

fn default_catalog_url() -> String {
    DEFAULT_EFFECT_MAP_URL.to_string()
}
fn default_timeout_secs() -> u64 { 10 }
fn default_room_change_delay_ms() -> u64 { 500 }
fn default_notification_enabled() -> bool { true }
fn default_notification_message() -> String {
    "Clientside Effects is ready! Pick an avatar and an effect to show it.".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Longest accepted reapply delay.
const MAX_ROOM_CHANGE_DELAY_MS: u64 = 10_000;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    /// Where the effect catalog comes from
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// Automatic reapplication tuning
    #[serde(default)]
    pub persistence: PersistenceSettings,
    /// Bubble shown once the catalog is loaded
    #[serde(default)]
    pub notification: NotificationSettings,
    /// Logging output
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Effect catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// URL of the effect map XML document
    #[serde(default = "default_catalog_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Persistence rule timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Delay between a room's user list arriving and the effect being reapplied
    #[serde(default = "default_room_change_delay_ms")]
    pub room_change_delay_ms: u64,
}

/// Catalog-ready notification bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_notification_enabled")]
    pub enabled: bool,
    #[serde(default = "default_notification_message")]
    pub message: String,
    /// Image shown in the bubble; omitted from the packet when empty
    #[serde(default)]
    pub image_url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            room_change_delay_ms: default_room_change_delay_ms(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_notification_enabled(),
            message: default_notification_message(),
            image_url: String::new(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl EffectConfig {
    /// Loads configuration from a TOML file, writing the defaults there first
    /// if the file does not exist yet.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: EffectConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = EffectConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.catalog.url.starts_with("http://") || self.catalog.url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "Catalog URL must be http(s): {}",
                self.catalog.url
            )));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "catalog.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.persistence.room_change_delay_ms > MAX_ROOM_CHANGE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "persistence.room_change_delay_ms must be at most {MAX_ROOM_CHANGE_DELAY_MS}"
            )));
        }

        if self.notification.enabled && self.notification.message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "notification.message cannot be empty when notifications are enabled".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            )));
        }

        Ok(())
    }
}
