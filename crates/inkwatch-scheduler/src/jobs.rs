//! The periodic collection job.

use crate::scheduler::{delay_until, is_run_due};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// When the next collection run happens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionSchedule {
    pub interval_minutes: u32,
    pub next_run_at: String,
    pub last_run_at: Option<String>,
}

impl CollectionSchedule {
    /// A schedule whose first run is due at `now` when `run_on_startup`,
    /// else one interval later.
    pub fn new(interval_minutes: u32, run_on_startup: bool, now: DateTime<Utc>) -> Self {
        let interval_minutes = interval_minutes.max(1);
        let first = if run_on_startup {
            now
        } else {
            now + Duration::minutes(i64::from(interval_minutes))
        };
        Self {
            interval_minutes,
            next_run_at: first.to_rfc3339(),
            last_run_at: None,
        }
    }

    /// Whether a run is due at `now`. Timer wake-ups can land early, so the
    /// daemon checks this before starting a run.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        is_run_due(&self.next_run_at, now)
    }

    /// How long to wait from `now` until the next run.
    pub fn wait(&self, now: DateTime<Utc>) -> std::time::Duration {
        delay_until(&self.next_run_at, now)
    }

    /// Record a run that started at `started` and schedule the next one.
    pub fn mark_run(&mut self, started: DateTime<Utc>) {
        let next = started + Duration::minutes(i64::from(self.interval_minutes));
        self.last_run_at = Some(started.to_rfc3339());
        self.next_run_at = next.to_rfc3339();
        tracing::debug!(next_run_at = %self.next_run_at, "next collection scheduled");
    }
}
