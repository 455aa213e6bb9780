//! Alert event storage.

use crate::error::{DatabaseError, Result};
use crate::timestamp_key;
use inkwatch_core::{AlertEvent, AlertKind};
use sqlx::{Pool, Sqlite};

/// Default number of alerts returned by [`alert_history`].
pub const DEFAULT_ALERT_LIMIT: u32 = 100;

/// Optional filters for [`alert_history`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Only alerts for this device identity
    pub device_identity: Option<String>,
    /// Only alerts of this kind
    pub kind: Option<AlertKind>,
}

/// Store an alert event. Returns the new row id.
pub async fn append_alert(pool: &Pool<Sqlite>, event: &AlertEvent) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let payload = serde_json::to_string(event)?;

    sqlx::query(
        "INSERT INTO alerts (id, ts, type, device_id, device_name, payload)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(timestamp_key(event.timestamp))
    .bind(event.kind.as_str())
    .bind(&event.device_identity)
    .bind(&event.device_name)
    .bind(&payload)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Stored alerts matching `filter`, newest first.
pub async fn alert_history(
    pool: &Pool<Sqlite>,
    filter: &AlertFilter,
    limit: u32,
) -> Result<Vec<AlertEvent>> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT payload FROM alerts
         WHERE (?1 IS NULL OR device_id = ?1) AND (?2 IS NULL OR type = ?2)
         ORDER BY ts DESC, rowid DESC
         LIMIT ?3",
    )
    .bind(filter.device_identity.as_deref())
    .bind(filter.kind.map(AlertKind::as_str))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|payload| {
            serde_json::from_str(payload).map_err(|e| DatabaseError::Decode(format!("alert: {e}")))
        })
        .collect()
}
