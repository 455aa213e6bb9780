//! Snapshot storage and history queries.
//!
//! A snapshot row holds the whole [`Snapshot`] as JSON; history queries
//! decode it and pick devices out with [`identity_of`].

use crate::error::{DatabaseError, Result};
use crate::timestamp_key;
use chrono::{DateTime, Utc};
use inkwatch_core::{identity_of, Device, Snapshot};
use serde::Serialize;
use sqlx::{Pool, Sqlite};

/// Default number of snapshots returned by [`list_snapshots`].
pub const DEFAULT_SNAPSHOT_LIMIT: u32 = 200;

/// One device's state in one stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHistoryEntry {
    /// Snapshot timestamp
    pub timestamp: DateTime<Utc>,
    /// The device, when it was reachable in that snapshot
    pub device: Option<Device>,
}

/// Store a snapshot. Returns the new row id.
pub async fn append_snapshot(pool: &Pool<Sqlite>, snapshot: &Snapshot) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let data = serde_json::to_string(snapshot)?;
    let device_count = i64::try_from(snapshot.devices.len()).unwrap_or(i64::MAX);

    sqlx::query("INSERT INTO snapshots (id, ts, device_count, data) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(timestamp_key(snapshot.timestamp))
        .bind(device_count)
        .bind(&data)
        .execute(pool)
        .await?;

    tracing::debug!(%id, devices = device_count, "snapshot stored");
    Ok(id)
}

/// The most recent snapshot, if any.
pub async fn latest_snapshot(pool: &Pool<Sqlite>) -> Result<Option<Snapshot>> {
    let data: Option<String> =
        sqlx::query_scalar("SELECT data FROM snapshots ORDER BY ts DESC, rowid DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    data.as_deref().map(decode).transpose()
}

/// Snapshots within `[from, to]`, newest first.
pub async fn list_snapshots(
    pool: &Pool<Sqlite>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: u32,
) -> Result<Vec<Snapshot>> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT data FROM snapshots
         WHERE (?1 IS NULL OR ts >= ?1) AND (?2 IS NULL OR ts <= ?2)
         ORDER BY ts DESC, rowid DESC
         LIMIT ?3",
    )
    .bind(from.map(timestamp_key))
    .bind(to.map(timestamp_key))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter().map(|data| decode(data)).collect()
}

/// The given device across the latest `limit` snapshots, newest first.
///
/// `key` matches a device's identity, its reported name or its configured
/// name. Snapshots where no device matches yield an entry without a device.
pub async fn device_history(
    pool: &Pool<Sqlite>,
    key: &str,
    limit: u32,
) -> Result<Vec<DeviceHistoryEntry>> {
    let snapshots = list_snapshots(pool, None, None, limit).await?;

    Ok(snapshots
        .into_iter()
        .map(|snapshot| DeviceHistoryEntry {
            timestamp: snapshot.timestamp,
            device: snapshot.devices.into_iter().find(|d| matches_key(d, key)),
        })
        .collect())
}

fn matches_key(device: &Device, key: &str) -> bool {
    identity_of(device) == key || device.device_name.as_deref() == Some(key) || device.name == key
}

fn decode(data: &str) -> Result<Snapshot> {
    serde_json::from_str(data).map_err(|e| DatabaseError::Decode(format!("snapshot: {e}")))
}
