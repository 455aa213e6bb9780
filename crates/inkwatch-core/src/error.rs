//! Core error types for inkwatch.
//!
//! Configuration loading has its own [`ConfigError`]; [`InkwatchError`] is what
//! storage backends report to the collection engine.

use thiserror::Error;

/// Engine-level error surfaced through the persistence seam.
#[derive(Error, Debug)]
pub enum InkwatchError {
    /// Storage errors (snapshot, run or alert persistence)
    #[error("storage error: {0}")]
    Storage(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Printers file is not valid JSON or has an unexpected shape
    #[error("failed to parse printers file: {0}")]
    Printers(#[from] serde_json::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `InkwatchError`.
pub type Result<T> = std::result::Result<T, InkwatchError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
