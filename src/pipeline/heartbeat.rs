//! Health-check cadence.

use chrono::{DateTime, Duration, Utc};

/// Whether a health check is due at `now`.
///
/// Fires when none was ever sent, then again once `interval` has elapsed.
/// A stored timestamp in the future (clock skew) counts as not elapsed.
pub fn is_due(last_sent: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    match last_sent {
        None => true,
        Some(last) => now - last >= interval,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_first_run_is_due() {
        assert!(is_due(None, at(0, 0), Duration::hours(4)));
    }

    #[test]
    fn test_interval_boundary() {
        let interval = Duration::hours(4);
        let last = Some(at(8, 0));
        assert!(!is_due(last, at(8, 0), interval));
        assert!(!is_due(last, at(11, 59), interval));
        assert!(is_due(last, at(12, 0), interval));
        assert!(is_due(last, at(23, 0), interval));
    }

    #[test]
    fn test_future_timestamp_is_not_due() {
        assert!(!is_due(Some(at(12, 0)), at(8, 0), Duration::hours(4)));
    }
}
