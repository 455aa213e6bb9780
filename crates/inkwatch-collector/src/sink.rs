//! Persistence seam for collection results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inkwatch_core::{AlertEvent, Device, InkwatchError, Snapshot};
use inkwatch_db::Database;

/// Durable storage the engine writes to. Queries are not part of this contract.
#[async_trait]
pub trait CollectionSink: Send + Sync {
    /// Store the canonical snapshot of a run.
    async fn append_snapshot(&self, snapshot: &Snapshot) -> inkwatch_core::Result<()>;

    /// Store the unfiltered per-target results of a run.
    async fn append_run(
        &self,
        timestamp: DateTime<Utc>,
        results: &[Device],
    ) -> inkwatch_core::Result<()>;

    /// Store one alert event.
    async fn append_alert(&self, event: &AlertEvent) -> inkwatch_core::Result<()>;
}

fn storage(err: inkwatch_db::DatabaseError) -> InkwatchError {
    InkwatchError::Storage(err.to_string())
}

#[async_trait]
impl CollectionSink for Database {
    async fn append_snapshot(&self, snapshot: &Snapshot) -> inkwatch_core::Result<()> {
        inkwatch_db::snapshots::append_snapshot(self.pool(), snapshot)
            .await
            .map(|_| ())
            .map_err(storage)
    }

    async fn append_run(
        &self,
        timestamp: DateTime<Utc>,
        results: &[Device],
    ) -> inkwatch_core::Result<()> {
        inkwatch_db::runs::append_run(self.pool(), timestamp, results)
            .await
            .map(|_| ())
            .map_err(storage)
    }

    async fn append_alert(&self, event: &AlertEvent) -> inkwatch_core::Result<()> {
        inkwatch_db::alerts::append_alert(self.pool(), event)
            .await
            .map(|_| ())
            .map_err(storage)
    }
}
