//! Run audit log: the unfiltered per-target results of every collection run.

use crate::error::Result;
use crate::timestamp_key;
use chrono::{DateTime, Utc};
use inkwatch_core::Device;
use sqlx::{Pool, Row, Sqlite};
use std::fmt::Write;

/// Default number of runs exported by [`export_run_counts_csv`].
pub const DEFAULT_EXPORT_LIMIT: u32 = 1000;

/// Counters of one stored run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Row id
    pub id: String,
    /// Run timestamp, as stored
    pub timestamp: String,
    /// Targets attempted
    pub device_count: i64,
    /// Targets that answered
    pub ok_count: i64,
    /// Targets recorded as errors
    pub error_count: i64,
}

/// Store the results of one run. Returns the new row id.
pub async fn append_run(
    pool: &Pool<Sqlite>,
    timestamp: DateTime<Utc>,
    results: &[Device],
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let data = serde_json::to_string(results)?;
    let ok = results.iter().filter(|d| d.is_ok()).count();
    let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);

    sqlx::query(
        "INSERT INTO collection_runs (id, ts, device_count, ok_count, error_count, data)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(timestamp_key(timestamp))
    .bind(count(results.len()))
    .bind(count(ok))
    .bind(count(results.len() - ok))
    .bind(&data)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Summaries of the latest `limit` runs, newest first.
pub async fn list_runs(pool: &Pool<Sqlite>, limit: u32) -> Result<Vec<RunSummary>> {
    let rows = sqlx::query(
        "SELECT id, ts, device_count, ok_count, error_count FROM collection_runs
         ORDER BY ts DESC, rowid DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(RunSummary {
                id: row.try_get("id")?,
                timestamp: row.try_get("ts")?,
                device_count: row.try_get("device_count")?,
                ok_count: row.try_get("ok_count")?,
                error_count: row.try_get("error_count")?,
            })
        })
        .collect()
}

/// Per-run counters as CSV (`ts,device_count,ok_count,error_count`), newest first.
pub async fn export_run_counts_csv(pool: &Pool<Sqlite>, limit: u32) -> Result<String> {
    let runs = list_runs(pool, limit).await?;

    let mut csv = String::from("ts,device_count,ok_count,error_count");
    for run in runs {
        let _ = write!(
            csv,
            "\n\"{}\",{},{},{}",
            run.timestamp, run.device_count, run.ok_count, run.error_count
        );
    }
    Ok(csv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use inkwatch_core::{DeviceStatus, Target};

    #[tokio::test]
    async fn test_csv_has_header_and_row_per_run() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let now = Utc::now();
        let ok = Device::bare(&Target::new("a", "https://10.0.0.1"), DeviceStatus::Ok, now);
        let down = Device::unreachable(&Target::new("b", "https://10.0.0.2"), "timeout", None, now);
        append_run(db.pool(), now - chrono::Duration::minutes(15), &[ok.clone()])
            .await
            .expect("append");
        append_run(db.pool(), now, &[ok, down]).await.expect("append");

        let csv = export_run_counts_csv(db.pool(), DEFAULT_EXPORT_LIMIT)
            .await
            .expect("export");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ts,device_count,ok_count,error_count");
        assert!(lines[1].ends_with(",2,1,1"), "got {}", lines[1]);
        assert!(lines[2].ends_with(",1,1,0"), "got {}", lines[2]);
        assert!(lines[1].starts_with('"'));
    }
}
