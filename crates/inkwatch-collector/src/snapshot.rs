//! Snapshot assembly.

use chrono::{DateTime, Utc};
use inkwatch_core::{AlertEvent, Device, Snapshot};
use serde::Serialize;

/// Outcome of one collection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRun {
    /// Canonical current state: reachable devices only
    pub snapshot: Snapshot,
    /// Every per-target outcome, in target order, for audit
    pub results: Vec<Device>,
    /// Alerts emitted for this snapshot
    pub alerts: Vec<AlertEvent>,
}

impl CollectionRun {
    /// Number of targets that answered.
    #[must_use]
    pub fn ok_count(&self) -> usize {
        self.results.iter().filter(|d| d.is_ok()).count()
    }

    /// Number of targets recorded as errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.len() - self.ok_count()
    }
}

/// Builds the canonical [`Snapshot`] from a run's raw results.
pub struct SnapshotAssembler;

impl SnapshotAssembler {
    /// Keep the `ok` devices, stamped with the assembly time.
    #[must_use]
    pub fn assemble(results: &[Device], timestamp: DateTime<Utc>) -> Snapshot {
        Snapshot {
            timestamp,
            devices: results.iter().filter(|d| d.is_ok()).cloned().collect(),
        }
    }

    /// Assemble at the current time and keep the unfiltered results alongside.
    #[must_use]
    pub fn assemble_run(results: Vec<Device>) -> CollectionRun {
        let snapshot = Self::assemble(&results, Utc::now());
        CollectionRun {
            snapshot,
            results,
            alerts: Vec::new(),
        }
    }
}
