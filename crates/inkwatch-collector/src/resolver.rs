//! Target resolution: printers document to an ordered, deduplicated target list.

use inkwatch_core::{PrintersConfig, Target};
use std::collections::HashSet;

/// Turn a printers document into the ordered fetch targets for one run.
///
/// Static printers come first, followed by one target per host number of
/// every scan prefix (when the scan block is enabled). Duplicate addresses are
/// dropped silently, first occurrence wins. `limit` truncates the final list;
/// a limit of 0 means no cap.
#[must_use]
pub fn resolve_targets(config: &PrintersConfig, limit: Option<usize>) -> Vec<Target> {
    let mut candidates: Vec<Target> = config
        .printers()
        .iter()
        .filter_map(|entry| {
            let address = entry.address()?;
            let name = entry
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(address);
            Some(Target::new(name, address))
        })
        .collect();

    if let Some(scan) = config.active_scan() {
        let (start, end) = scan.range();
        let protocol = scan.protocol();
        for prefix in scan.normalized_prefixes() {
            for host in start..=end {
                let name = format!("{}{host}", prefix.prefix);
                let mut target = Target::new(name.clone(), format!("{protocol}://{name}"));
                target.location_label.clone_from(&prefix.label);
                candidates.push(target);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut targets: Vec<Target> = candidates
        .into_iter()
        .filter(|t| seen.insert(t.address.clone()))
        .collect();

    if let Some(limit) = limit.filter(|&n| n > 0) {
        targets.truncate(limit);
    }

    tracing::debug!(count = targets.len(), "resolved collection targets");
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwatch_core::{PrefixSpec, PrinterEntry, PrintersDocument, ScanConfig};

    fn scan(prefixes: Vec<PrefixSpec>, start: u32, end: u32) -> ScanConfig {
        ScanConfig {
            enabled: true,
            prefixes: Some(prefixes),
            start: Some(start),
            end: Some(end),
            protocol: Some("http".into()),
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_scan_range_is_inclusive() {
        let config = PrintersConfig::Document(PrintersDocument {
            scan: Some(scan(vec![PrefixSpec::Plain("10.0.0.".into())], 1, 3)),
            ..PrintersDocument::default()
        });

        let targets = resolve_targets(&config, None);
        let addresses: Vec<_> = targets.iter().map(|t| t.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec!["http://10.0.0.1", "http://10.0.0.2", "http://10.0.0.3"]
        );
        assert_eq!(targets[0].name, "10.0.0.1");
    }

    #[test]
    fn test_static_entries_win_over_scanned_duplicates() {
        let config = PrintersConfig::Document(PrintersDocument {
            printers: vec![
                PrinterEntry::new("Reception", "http://10.0.0.2"),
                PrinterEntry::new("Reception again", "http://10.0.0.2"),
            ],
            scan: Some(scan(
                vec![PrefixSpec::Labeled {
                    prefix: Some("10.0.0.".into()),
                    label: Some("HQ".into()),
                }],
                1,
                3,
            )),
            threshold: None,
        });

        let targets = resolve_targets(&config, None);
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].name, "Reception");
        assert_eq!(targets[0].location_label, None);
        assert_eq!(targets[1].address, "http://10.0.0.1");
        assert_eq!(targets[1].location_label.as_deref(), Some("HQ"));

        let unique: HashSet<_> = targets.iter().map(|t| &t.address).collect();
        assert_eq!(unique.len(), targets.len());
    }

    #[test]
    fn test_limit_preserves_order() {
        let config = PrintersConfig::Document(PrintersDocument {
            printers: vec![PrinterEntry::new("Lobby", "https://printer.local")],
            scan: Some(scan(vec![PrefixSpec::Plain("10.0.0.".into())], 1, 10)),
            threshold: None,
        });

        let targets = resolve_targets(&config, Some(3));
        let addresses: Vec<_> = targets.iter().map(|t| t.address.as_str()).collect();
        assert_eq!(
            addresses,
            vec!["https://printer.local", "http://10.0.0.1", "http://10.0.0.2"]
        );
    }

    #[test]
    fn test_zero_limit_is_uncapped() {
        let config = PrintersConfig::Document(PrintersDocument {
            scan: Some(scan(vec![PrefixSpec::Plain("10.0.0.".into())], 1, 4)),
            ..PrintersDocument::default()
        });

        assert_eq!(resolve_targets(&config, Some(0)).len(), 4);
        assert_eq!(resolve_targets(&config, Some(0)), resolve_targets(&config, None));
    }

    #[test]
    fn test_entries_without_address_are_skipped() {
        let config = PrintersConfig::List(vec![
            PrinterEntry {
                name: Some("Nowhere".into()),
                ..PrinterEntry::default()
            },
            PrinterEntry {
                name: None,
                ip: None,
                url: Some("http://10.1.1.1".into()),
            },
        ]);

        let targets = resolve_targets(&config, None);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "http://10.1.1.1");
    }

    #[test]
    fn test_empty_range_yields_no_scan_targets() {
        let config = PrintersConfig::Document(PrintersDocument {
            scan: Some(scan(vec![PrefixSpec::Plain("10.0.0.".into())], 5, 4)),
            ..PrintersDocument::default()
        });
        assert!(resolve_targets(&config, None).is_empty());
    }
}
