//! Inkwatch Core - Foundation crate for the inkwatch printer monitor.
//!
//! This crate provides the shared data model, error handling and configuration
//! management that the collector, storage and daemon crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based engine configuration with XDG paths
//! - [`printers`] - JSON printers document (static list + subnet scan)
//! - [`types`] - Targets, devices, snapshots and alert events
//!
//! # Example
//!
//! ```rust
//! use inkwatch_core::{AppConfig, PrintersConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let printers = PrintersConfig::from_json(r#"[{"name":"Lobby","ip":"https://10.0.0.5"}]"#)?;
//! assert_eq!(printers.printers().len(), 1);
//! assert_eq!(config.alerts.default_threshold(), 15);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod printers;
#[allow(missing_docs)]
pub mod types;

// Re-export commonly used types
pub use config::{
    AlertsConfig, AppConfig, CollectorConfig, ScheduleConfig, StorageConfig,
    DEFAULT_ALERT_THRESHOLD,
};
pub use error::{ConfigError, ConfigResult, InkwatchError, Result};
pub use printers::{PrefixSpec, PrinterEntry, PrintersConfig, PrintersDocument, ScanConfig, ScanPrefix};
pub use types::{
    identity_of, AlertEvent, AlertKind, Device, DeviceStatus, DeviceType, Snapshot, Supply,
    Target, Tray,
};
