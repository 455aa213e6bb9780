//! Inkwatch Database Layer
//!
//! `SQLite` storage for collection results, using `SQLx` with embedded
//! migrations.
//!
//! # Tables
//!
//! - **snapshots**: canonical point-in-time views (reachable devices only)
//! - **alerts**: low-supply alert events
//! - **collection_runs**: audit log with every per-target outcome of a run
//!
//! # Example
//!
//! ```ignore
//! use inkwatch_db::{snapshots, Database};
//!
//! let db = Database::new("inkwatch.db").await?;
//! db.run_migrations().await?;
//! let latest = snapshots::latest_snapshot(db.pool()).await?;
//! ```
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (UTC, microseconds)
//! so that ordering and range filters can compare them as text.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerts;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod runs;
pub mod snapshots;

// Re-export commonly used types
pub use alerts::{AlertFilter, DEFAULT_ALERT_LIMIT};
pub use error::{DatabaseError, Result};
pub use runs::{RunSummary, DEFAULT_EXPORT_LIMIT};
pub use snapshots::{DeviceHistoryEntry, DEFAULT_SNAPSHOT_LIMIT};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Sortable text form of a timestamp.
pub(crate) fn timestamp_key(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// High-level database handle owning the connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database at `path`. `:memory:` opens a private
    /// in-memory database.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Number of the latest applied migration.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close all connections.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
