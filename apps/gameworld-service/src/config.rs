//! Service configuration.
//!
//! ## Sources (later wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Built-in defaults            (serde defaults below)                 │
//! │  2. Config file (optional)       gameworld.toml / gameworld.json        │
//! │  3. Environment                  GAMEWORLD_DATABASE__HOST=db.internal   │
//! │                                  GAMEWORLD_SERVICE__MAX_PAGE_SIZE=500   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loaded value is published through a [`ConfigWatcher`]; components
//! hold a `watch::Receiver` and read the latest settings per request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use gameworld_db::DbConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GAMEWORLD";

// =============================================================================
// Settings
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database: DatabaseSettings,
    pub service: ServiceSettings,
    pub logging: LoggingSettings,
}

/// Store connection and pool sizing.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: usize,
    /// Seconds to wait for a pooled connection; 0 waits indefinitely.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            host: "localhost".to_string(),
            port: 5432,
            name: "gameworld".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> DbConfig {
        let timeout = match self.acquire_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        DbConfig::new(&self.host, &self.name, &self.user)
            .port(self.port)
            .password(&self.password)
            .max_connections(self.max_connections)
            .acquire_timeout(timeout)
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"****")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Request handling limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Used when a list request asks for 0 or a negative page size.
    pub default_page_size: usize,
    /// Hard cap on page size.
    pub max_page_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

impl ServiceSettings {
    /// Resolves a requested page size against the defaults and cap.
    pub fn page_size(&self, requested: i32) -> usize {
        if requested <= 0 {
            self.default_page_size
        } else {
            (requested as usize).min(self.max_page_size)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `gameworld_db=debug,info`.
    /// `RUST_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl ServiceConfig {
    /// Loads defaults, then `path` (if any), then `GAMEWORLD_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.port == 0 {
            return Err(ConfigError::invalid("database.port", "must be in 1..=65535"));
        }
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::invalid("database.host", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid("database.max_connections", "must be at least 1"));
        }
        if self.service.default_page_size == 0 {
            return Err(ConfigError::invalid("service.default_page_size", "must be at least 1"));
        }
        if self.service.max_page_size < self.service.default_page_size {
            return Err(ConfigError::invalid(
                "service.max_page_size",
                "must not be smaller than default_page_size",
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Watcher
// =============================================================================

/// Owns the current configuration and publishes replacements.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: Option<PathBuf>,
    sender: watch::Sender<ServiceConfig>,
}

impl ConfigWatcher {
    /// Loads the initial configuration from `path` and the environment.
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = ServiceConfig::load(path.as_deref())?;
        let (sender, _) = watch::channel(config);
        Ok(ConfigWatcher { path, sender })
    }

    /// A watcher over a fixed value; `reload` re-reads the environment only.
    pub fn from_config(config: ServiceConfig) -> Self {
        let (sender, _) = watch::channel(config);
        ConfigWatcher { path: None, sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceConfig> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> ServiceConfig {
        self.sender.borrow().clone()
    }

    /// Re-reads the sources and publishes the result if it differs.
    ///
    /// An invalid configuration is rejected and the previous one stays
    /// active. Returns whether subscribers saw a change.
    pub fn reload(&self) -> Result<bool, ConfigError> {
        let fresh = match ServiceConfig::load(self.path.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Configuration reload rejected, keeping previous settings");
                return Err(e);
            }
        };
        Ok(self.publish_if_changed(fresh))
    }

    /// Validates and publishes `config`.
    pub fn publish(&self, config: ServiceConfig) -> Result<bool, ConfigError> {
        config.validate()?;
        Ok(self.publish_if_changed(config))
    }

    fn publish_if_changed(&self, config: ServiceConfig) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == config {
                false
            } else {
                *current = config;
                true
            }
        });
        if changed {
            info!("Configuration updated");
        }
        changed
    }
}
