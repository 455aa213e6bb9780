//! Configuration management for inkwatch.
//!
//! Provides TOML-based engine configuration with XDG-compliant paths and
//! environment variable overrides. The printer target list lives in a
//! separate JSON document, see [`crate::printers`].

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Threshold used when neither the printers file nor the environment sets one.
pub const DEFAULT_ALERT_THRESHOLD: u32 = 15;

/// Main application configuration.
///
/// This is loaded from `~/.config/inkwatch/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP collection settings
    pub collector: CollectorConfig,
    /// Low-supply alert settings
    pub alerts: AlertsConfig,
    /// Snapshot/alert storage settings
    pub storage: StorageConfig,
    /// Periodic run settings
    pub schedule: ScheduleConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `INKWATCH_ALERT_THRESHOLD`: environment-level low-supply threshold
    /// - `INKWATCH_PRINTERS_FILE`: path of the printers JSON document
    /// - `INKWATCH_DATABASE`: path of the history database
    /// - `INKWATCH_INTERVAL_MINUTES`: minutes between scheduled runs
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("INKWATCH_ALERT_THRESHOLD") {
            if let Ok(threshold) = val.trim().parse() {
                self.alerts.threshold = Some(threshold);
                tracing::debug!("Override alerts.threshold from env: {}", threshold);
            }
        }

        if let Some(val) = lookup("INKWATCH_PRINTERS_FILE") {
            tracing::debug!("Override schedule.printers_file from env: {}", val);
            self.schedule.printers_file = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("INKWATCH_DATABASE") {
            tracing::debug!("Override storage.database_path from env: {}", val);
            self.storage.database_path = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("INKWATCH_INTERVAL_MINUTES") {
            if let Ok(minutes) = val.trim().parse() {
                self.schedule.interval_minutes = minutes;
                tracing::debug!("Override schedule.interval_minutes from env: {}", minutes);
            }
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/inkwatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/inkwatch`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Resolved printers file: the configured path or `<config dir>/printers.json`.
    pub fn printers_file(&self) -> ConfigResult<PathBuf> {
        match &self.schedule.printers_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.config_dir().join("printers.json")),
        }
    }

    /// Resolved database path: the configured path or `<data dir>/history.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("history.db")),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "inkwatch", "inkwatch").ok_or(ConfigError::NoConfigDir)
}

/// HTTP collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Accept self-signed certificates served by printer web interfaces
    pub accept_invalid_certs: bool,
    /// User agent string
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 7,
            accept_invalid_certs: true,
            user_agent: concat!("inkwatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Low-supply alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Environment-level threshold, used when the printers file sets none
    pub threshold: Option<u32>,
    /// Per-subscriber queue depth before events are dropped for that subscriber
    pub subscriber_buffer: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            subscriber_buffer: 64,
        }
    }
}

impl AlertsConfig {
    /// Environment-level threshold with the hardcoded fallback applied.
    #[must_use]
    pub fn default_threshold(&self) -> u32 {
        self.threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// History database path (defaults to the XDG data dir)
    pub database_path: Option<PathBuf>,
}

/// Periodic run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between scheduled collection runs
    pub interval_minutes: u32,
    /// Run one collection immediately at startup
    pub run_on_startup: bool,
    /// Printers JSON document (defaults to the XDG config dir)
    pub printers_file: Option<PathBuf>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            run_on_startup: true,
            printers_file: None,
        }
    }
}
