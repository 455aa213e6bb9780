//! Low-supply threshold alerts.
//!
//! Each device raises at most one alert per snapshot: the first supply, in
//! page order, whose parsed level is at or below the threshold. A device with
//! several critical supplies therefore reports only one of them per run.

use crate::sink::CollectionSink;
use crate::subscribers::{PublishReport, SubscriberRegistry};
use inkwatch_core::{AlertEvent, AlertKind, Snapshot, DEFAULT_ALERT_THRESHOLD};

/// Pick the effective threshold: per-config override, then the environment
/// level default, then [`DEFAULT_ALERT_THRESHOLD`].
#[must_use]
pub fn resolve_threshold(config_override: Option<u32>, env_default: Option<u32>) -> u32 {
    config_override
        .or(env_default)
        .unwrap_or(DEFAULT_ALERT_THRESHOLD)
}

/// Evaluates snapshots and fans alerts out to storage and subscribers.
#[derive(Clone, Default)]
pub struct AlertEngine {
    registry: SubscriberRegistry,
}

impl AlertEngine {
    /// Create an engine publishing to `registry`.
    #[must_use]
    pub fn new(registry: SubscriberRegistry) -> Self {
        Self { registry }
    }

    /// The subscriber registry alerts are published to.
    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Alerts for `snapshot` at `threshold`, at most one per device.
    ///
    /// Events carry the snapshot timestamp, so evaluation is deterministic.
    #[must_use]
    pub fn evaluate(snapshot: &Snapshot, threshold: u32) -> Vec<AlertEvent> {
        snapshot
            .devices
            .iter()
            .filter_map(|device| {
                device.supplies.iter().find_map(|supply| {
                    let level = supply.percent()?;
                    (level <= threshold).then(|| AlertEvent {
                        kind: AlertKind::LowSupply,
                        device_identity: device.identity.clone(),
                        device_name: device.display_name.clone(),
                        supply: supply.name.clone(),
                        level: level.to_string(),
                        timestamp: snapshot.timestamp,
                    })
                })
            })
            .collect()
    }

    /// Persist each event, then publish it.
    ///
    /// A storage failure is logged and does not stop publishing.
    pub async fn emit(&self, events: &[AlertEvent], sink: &dyn CollectionSink) -> PublishReport {
        let mut total = PublishReport::default();
        for event in events {
            if let Err(err) = sink.append_alert(event).await {
                tracing::warn!(
                    device = %event.device_identity,
                    error = %err,
                    "failed to persist alert"
                );
            }

            let report = self.registry.publish(event);
            total.delivered += report.delivered;
            total.failed += report.failed;

            tracing::info!(
                device = %event.device_identity,
                supply = %event.supply,
                level = %event.level,
                subscribers = report.delivered,
                "low supply alert"
            );
        }
        total
    }
}
