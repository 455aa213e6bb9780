//! Shared data model used across the inkwatch crates.
//!
//! Field names of [`Device`], [`Supply`] and [`Tray`] are serialized in the
//! camelCase shape the dashboard consumes (`deviceName`, `deviceIp`,
//! `supplies[].level`, `location`, ...) and must stay stable.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static LEVEL_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("level digits regex is hardcoded and valid"));

/// One network address scheduled for a single fetch attempt in a collection run.
///
/// Identity is the `address`; the resolver guarantees it is unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// Configured or synthesized display name
    pub name: String,
    /// Fetch URL, e.g. `https://10.0.0.12`
    pub address: String,
    /// Location label carried over from a labeled scan prefix
    pub location_label: Option<String>,
}

impl Target {
    /// Create a target without a location label.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            location_label: None,
        }
    }

    /// Attach a location label.
    #[must_use]
    pub fn with_location(mut self, label: impl Into<String>) -> Self {
        self.location_label = Some(label.into());
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// A consumable (toner/ink) with its vendor-formatted remaining level.
///
/// The raw level string is kept as reported (`"<10%"`, `"90%*"`) and the
/// numeric percentage is derived on demand with [`Supply::percent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    /// Supply label as shown by the device
    pub name: String,
    /// Raw level string, if the device exposed one
    pub level: Option<String>,
}

impl Supply {
    /// Create a supply entry.
    #[must_use]
    pub fn new(name: impl Into<String>, level: Option<String>) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    /// Numeric level: the first run of digits in the raw level string.
    #[must_use]
    pub fn percent(&self) -> Option<u32> {
        let level = self.level.as_deref()?;
        LEVEL_DIGITS
            .find(level)
            .and_then(|m| m.as_str().parse::<u32>().ok())
    }
}

/// A paper tray row as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tray {
    pub name: String,
    pub status: String,
    pub capacity: String,
    pub size: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

/// Outcome of the fetch for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Page fetched and handed to extraction
    Ok,
    /// Network failure, timeout, non-2xx response or an internal fault
    Error,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Colour capability inferred from supply names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Color,
    Mono,
}

/// Structured telemetry for one printer in one collection run.
///
/// Created fresh per run and never mutated afterwards; the next run's device
/// with the same [`identity`](Device::identity) supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Stable correlation key, see [`identity_of`]
    pub identity: String,
    /// Configured name of the target
    pub name: String,
    /// Best human-facing label
    pub display_name: String,
    /// Fetch URL
    pub url: String,
    /// Name reported by the device itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// IP reported by the device itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_status: Option<String>,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub supplies: Vec<Supply>,
    #[serde(default)]
    pub trays: Vec<Tray>,
    /// Total page count as reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, rename = "location", skip_serializing_if = "Option::is_none")]
    pub location_label: Option<String>,
}

impl Device {
    /// Build the error stub recorded when a target could not be collected.
    #[must_use]
    pub fn unreachable(
        target: &Target,
        error: impl Into<String>,
        status_code: Option<u16>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut device = Self::bare(target, DeviceStatus::Error, timestamp);
        device.error = Some(error.into());
        device.status_code = status_code;
        device.identity = identity_of(&device);
        device
    }

    /// A device carrying only the target's name, URL and location.
    #[must_use]
    pub fn bare(target: &Target, status: DeviceStatus, timestamp: DateTime<Utc>) -> Self {
        let mut device = Self {
            identity: String::new(),
            name: target.name.clone(),
            display_name: target.name.clone(),
            url: target.address.clone(),
            device_name: None,
            device_ip: None,
            title: None,
            machine_status: None,
            status,
            status_code: None,
            error: None,
            timestamp,
            supplies: Vec::new(),
            trays: Vec::new(),
            pages: None,
            device_type: None,
            location_label: target.location_label.clone(),
        };
        if device.display_name.is_empty() {
            device.display_name.clone_from(&device.url);
        }
        device.identity = identity_of(&device);
        device
    }

    /// Whether the fetch for this device succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == DeviceStatus::Ok
    }
}

/// The single key used to correlate devices across runs.
///
/// Device-reported IP first, then the fetch URL, then the configured name.
/// History lookups, alert deduplication and mute lists all go through here.
#[must_use]
pub fn identity_of(device: &Device) -> String {
    [device.device_ip.as_deref(), Some(device.url.as_str())]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(device.name.as_str())
        .to_string()
}

/// Point-in-time view of all successfully reachable devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Time the run was assembled
    pub timestamp: DateTime<Utc>,
    /// Only `status: ok` devices
    pub devices: Vec<Device>,
}

impl Snapshot {
    /// An empty snapshot stamped with `timestamp`.
    #[must_use]
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            devices: Vec::new(),
        }
    }
}

/// Kind of alert event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    LowSupply,
}

impl AlertKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowSupply => "low-supply",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A low-supply alert for one device in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub device_identity: String,
    pub device_name: String,
    /// Name of the supply that crossed the threshold
    pub supply: String,
    /// Parsed numeric level, as a string
    pub level: String,
    pub timestamp: DateTime<Utc>,
}
