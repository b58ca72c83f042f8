//! # Ledger Configuration
//!
//! Settings for the database, notification dispatch and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PODO_DB_PATH=/srv/podo/ledger.db                                   │
//! │     PODO_LOG_FORMAT=json                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/books/ledger.toml (Linux)                                │
//! │     ~/Library/Application Support/com.podo.books/ledger.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ledger.db in the platform data dir, ring of 100                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # ledger.toml
//! [database]
//! path = "/srv/podo/ledger.db"
//! max_connections = 5
//!
//! [notifications]
//! capacity = 100      # ring size, newest first
//! channel_size = 256  # notifications waiting for the worker
//!
//! [logging]
//! level = "info,sqlx=warn"
//! format = "pretty"   # pretty | json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::logging::LoggingConfig;
use crate::pool::DbConfig;
use podo_core::NOTIFICATION_CAPACITY;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` uses the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// `[notifications]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// How many notifications the ring keeps.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How many notifications may wait for the worker before new ones drop.
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
}

fn default_capacity() -> usize {
    NOTIFICATION_CAPACITY
}

fn default_channel_size() -> usize {
    256
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            capacity: default_capacity(),
            channel_size: default_channel_size(),
        }
    }
}

// =============================================================================
// Ledger Configuration
// =============================================================================

/// Complete configuration of a ledger process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LedgerConfig {
    /// Loads the file (if present), then environment overrides, then validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading ledger config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load ledger config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(?path, "Ledger config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be greater than 0".into()));
        }
        if self.notifications.capacity == 0 {
            return Err(ConfigError::Invalid("notification capacity must be greater than 0".into()));
        }
        if self.notifications.channel_size == 0 {
            return Err(ConfigError::Invalid("channel_size must be greater than 0".into()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("log level must not be empty".into()));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `PODO_*` overrides read through `lookup`.
    /// Values that do not parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("PODO_DB_PATH") {
            debug!(%path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("PODO_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid PODO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(capacity) = lookup("PODO_NOTIFICATION_CAPACITY") {
            match capacity.parse() {
                Ok(n) => self.notifications.capacity = n,
                Err(_) => warn!(value = %capacity, "Ignoring invalid PODO_NOTIFICATION_CAPACITY"),
            }
        }

        if let Some(level) = lookup("PODO_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("PODO_LOG_FORMAT") {
            match format.parse() {
                Ok(f) => self.logging.format = f,
                Err(e) => warn!(%e, "Ignoring PODO_LOG_FORMAT"),
            }
        }
    }

    /// Platform config file location.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "podo", "books").map(|dirs| dirs.config_dir().join("ledger.toml"))
    }

    /// Platform data file location for the database.
    pub fn default_database_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "podo", "books").map(|dirs| dirs.data_dir().join("ledger.db"))
    }

    /// Pool settings for [`crate::Database::new`].
    ///
    /// ## Errors
    /// `Invalid` when no path is configured and the platform has no data dir.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        let path = self
            .database
            .path
            .clone()
            .or_else(Self::default_database_path)
            .ok_or_else(|| ConfigError::Invalid("no database path configured".into()))?;

        Ok(DbConfig::new(path).max_connections(self.database.max_connections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.notifications.capacity, 100);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: LedgerConfig = toml::from_str(
            r#"
            [database]
            path = "/srv/podo/ledger.db"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/srv/podo/ledger.db")));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.notifications.capacity, 100);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("PODO_DB_PATH", "/tmp/podo.db"),
            ("PODO_DB_MAX_CONNECTIONS", "not-a-number"),
            ("PODO_NOTIFICATION_CAPACITY", "20"),
            ("PODO_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = LedgerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/podo.db")));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.notifications.capacity, 20);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validation() {
        let mut config = LedgerConfig::default();
        config.notifications.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config = LedgerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("podo-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("ledger.toml");

        let mut config = LedgerConfig::default();
        config.database.path = Some(PathBuf::from("/srv/podo/ledger.db"));
        config.save(&path).unwrap();

        assert_eq!(LedgerConfig::from_file(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_db_config_uses_configured_path() {
        let mut config = LedgerConfig::default();
        config.database.path = Some(PathBuf::from("/srv/podo/ledger.db"));
        config.database.max_connections = 3;

        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/srv/podo/ledger.db"));
        assert_eq!(db.max_connections, 3);
    }
}
