//! Run scheduling: when the next collection is due.

use chrono::{DateTime, Utc};

/// Whether a run scheduled for `next_run_at` should start at `now`.
///
/// Unparsable timestamps are never due.
pub fn is_run_due(next_run_at: &str, now: DateTime<Utc>) -> bool {
    DateTime::parse_from_rfc3339(next_run_at).is_ok_and(|next| next <= now)
}

/// Time left until `next_run_at`, zero when already due or unparsable.
pub fn delay_until(next_run_at: &str, now: DateTime<Utc>) -> std::time::Duration {
    DateTime::parse_from_rfc3339(next_run_at)
        .ok()
        .and_then(|next| (next.with_timezone(&Utc) - now).to_std().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-17T12:00:00Z")
            .expect("valid")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_run_is_due_past_next_run() {
        assert!(is_run_due("2026-02-17T11:00:00Z", noon()));
        assert!(is_run_due("2026-02-17T12:00:00Z", noon()));
        assert!(is_run_due("2026-02-17T13:00:00+02:00", noon()));
    }

    #[test]
    fn test_run_not_due_future_next_run() {
        assert!(!is_run_due("2026-02-17T13:00:00Z", noon()));
        assert!(!is_run_due("not a time", noon()));
    }

    #[test]
    fn test_delay_until() {
        let now = noon();
        assert_eq!(
            delay_until("2026-02-17T12:15:00Z", now),
            std::time::Duration::from_secs(900)
        );
        assert_eq!(delay_until("2026-02-17T11:00:00Z", now), std::time::Duration::ZERO);
        assert_eq!(delay_until("garbage", now), std::time::Duration::ZERO);
    }
}
