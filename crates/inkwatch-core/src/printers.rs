//! The printers document: static printer list plus optional subnet scan.
//!
//! Two shapes are accepted, matching what operators already keep on disk:
//!
//! ```json
//! [{ "name": "Lobby", "ip": "https://10.0.0.5" }]
//! ```
//!
//! ```json
//! {
//!   "printers": [{ "name": "Lobby", "url": "https://10.0.0.5" }],
//!   "scan": { "enabled": true, "prefixes": ["10.0.1.", { "prefix": "10.0.2.", "label": "Annex" }],
//!             "start": 1, "end": 254, "protocol": "https", "concurrency": 15 },
//!   "threshold": 20
//! }
//! ```

use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Subnet scanned when a scan block names no prefixes.
pub const DEFAULT_SCAN_PREFIX: &str = "10.12.86.";

/// Default number of concurrent fetches.
pub const DEFAULT_CONCURRENCY: usize = 15;

const DEFAULT_SCAN_START: u32 = 1;
const DEFAULT_SCAN_END: u32 = 254;
const DEFAULT_PROTOCOL: &str = "https";

/// Collection input consumed once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrintersConfig {
    /// Bare list of printers
    List(Vec<PrinterEntry>),
    /// Printers plus scan and threshold settings
    Document(PrintersDocument),
}

impl Default for PrintersConfig {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Object form of the printers document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintersDocument {
    /// Statically configured printers
    #[serde(default)]
    pub printers: Vec<PrinterEntry>,
    /// Optional subnet scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanConfig>,
    /// Low-supply threshold override for this deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
}

/// One statically configured printer. `ip` and `url` are synonyms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterEntry {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fetch URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Fetch URL (alternative key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PrinterEntry {
    /// Create an entry with a name and address.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ip: Some(address.into()),
            url: None,
        }
    }

    /// The fetch address, `ip` taking precedence over `url`.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        [self.ip.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|a| !a.is_empty())
    }
}

/// Subnet scan block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scan only runs when enabled
    #[serde(default)]
    pub enabled: bool,
    /// Address prefixes, plain or labeled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<PrefixSpec>>,
    /// Legacy single-prefix key, used when `prefixes` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// First host number (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Last host number (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
    /// URL scheme for synthesized targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Concurrent fetch cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

/// A scan prefix as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefixSpec {
    /// `"10.0.1."`
    Plain(String),
    /// `{ "prefix": "10.0.2.", "label": "Annex" }`
    Labeled {
        /// Address prefix
        #[serde(default)]
        prefix: Option<String>,
        /// Location label for every host under this prefix
        #[serde(default)]
        label: Option<String>,
    },
}

/// Normalized scan prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPrefix {
    /// Address prefix, e.g. `10.0.2.`
    pub prefix: String,
    /// Location label
    pub label: Option<String>,
}

impl ScanConfig {
    /// Prefixes normalized to `{prefix, label}`; entries without a prefix are dropped.
    #[must_use]
    pub fn normalized_prefixes(&self) -> Vec<ScanPrefix> {
        let raw = match &self.prefixes {
            Some(prefixes) => prefixes.clone(),
            None => vec![PrefixSpec::Plain(
                self.base
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SCAN_PREFIX.to_string()),
            )],
        };

        raw.into_iter()
            .filter_map(|spec| match spec {
                PrefixSpec::Plain(prefix) => Some(ScanPrefix {
                    prefix,
                    label: None,
                }),
                PrefixSpec::Labeled { prefix, label } => {
                    prefix.filter(|p| !p.is_empty()).map(|prefix| ScanPrefix {
                        prefix,
                        label: label.filter(|l| !l.is_empty()),
                    })
                }
            })
            .collect()
    }

    /// Inclusive host-number range.
    #[must_use]
    pub fn range(&self) -> (u32, u32) {
        (
            self.start.filter(|&n| n > 0).unwrap_or(DEFAULT_SCAN_START),
            self.end.filter(|&n| n > 0).unwrap_or(DEFAULT_SCAN_END),
        )
    }

    /// URL scheme for synthesized targets.
    #[must_use]
    pub fn protocol(&self) -> &str {
        self.protocol
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROTOCOL)
    }
}

impl PrintersConfig {
    /// Statically configured printers.
    #[must_use]
    pub fn printers(&self) -> &[PrinterEntry] {
        match self {
            Self::List(list) => list,
            Self::Document(doc) => &doc.printers,
        }
    }

    /// The scan block, only if present and enabled.
    #[must_use]
    pub fn active_scan(&self) -> Option<&ScanConfig> {
        match self {
            Self::List(_) => None,
            Self::Document(doc) => doc.scan.as_ref().filter(|scan| scan.enabled),
        }
    }

    /// Deployment-level threshold override.
    #[must_use]
    pub fn threshold(&self) -> Option<u32> {
        match self {
            Self::List(_) => None,
            Self::Document(doc) => doc.threshold,
        }
    }

    /// Concurrent fetch cap, from an active scan block or the default.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.active_scan()
            .and_then(|scan| scan.concurrency)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CONCURRENCY)
    }

    /// Parse a printers document from JSON text.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the printers document, treating a missing file as an empty list.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Printers file {} not found, no targets", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_list_parses() {
        let config = PrintersConfig::from_json(
            r#"[{"name":"Lobby","ip":"https://10.0.0.5"},{"url":"http://10.0.0.6"}]"#,
        )
        .expect("parse list");

        assert_eq!(config.printers().len(), 2);
        assert_eq!(config.printers()[0].address(), Some("https://10.0.0.5"));
        assert_eq!(config.printers()[1].address(), Some("http://10.0.0.6"));
        assert!(config.active_scan().is_none());
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_document_with_mixed_prefixes() {
        let config = PrintersConfig::from_json(
            r#"{
                "printers": [],
                "scan": {
                    "enabled": true,
                    "prefixes": ["10.0.1.", {"prefix": "10.0.2.", "label": "Annex"}, {"label": "orphan"}],
                    "concurrency": 4
                },
                "threshold": 20
            }"#,
        )
        .expect("parse document");

        let scan = config.active_scan().expect("scan enabled");
        assert_eq!(
            scan.normalized_prefixes(),
            vec![
                ScanPrefix {
                    prefix: "10.0.1.".into(),
                    label: None
                },
                ScanPrefix {
                    prefix: "10.0.2.".into(),
                    label: Some("Annex".into())
                },
            ]
        );
        assert_eq!(scan.range(), (1, 254));
        assert_eq!(scan.protocol(), "https");
        assert_eq!(config.concurrency(), 4);
        assert_eq!(config.threshold(), Some(20));
    }

    #[test]
    fn test_disabled_scan_is_ignored() {
        let config =
            PrintersConfig::from_json(r#"{"printers":[],"scan":{"enabled":false,"concurrency":2}}"#)
                .expect("parse document");
        assert!(config.active_scan().is_none());
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_legacy_base_and_default_prefix() {
        let legacy = ScanConfig {
            enabled: true,
            base: Some("192.168.1.".into()),
            ..ScanConfig::default()
        };
        assert_eq!(legacy.normalized_prefixes()[0].prefix, "192.168.1.");

        let bare = ScanConfig {
            enabled: true,
            ..ScanConfig::default()
        };
        assert_eq!(bare.normalized_prefixes()[0].prefix, DEFAULT_SCAN_PREFIX);
    }

    #[test]
    fn test_zero_range_bounds_use_defaults() {
        let scan = ScanConfig {
            enabled: true,
            start: Some(0),
            end: Some(0),
            ..ScanConfig::default()
        };
        assert_eq!(scan.range(), (DEFAULT_SCAN_START, DEFAULT_SCAN_END));

        let partial = ScanConfig {
            start: Some(0),
            end: Some(20),
            ..ScanConfig::default()
        };
        assert_eq!(partial.range(), (1, 20));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = PrintersConfig::load(dir.path().join("printers.json")).expect("load");
        assert!(config.printers().is_empty());
    }

    #[test]
    fn test_load_invalid_json_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("printers.json");
        std::fs::write(&path, "{ not json").expect("write file");
        assert!(PrintersConfig::load(&path).is_err());
    }
}
