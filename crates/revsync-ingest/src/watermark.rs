use chrono::{DateTime, Utc};
use revsync_core::lookback_start;

/// The incremental boundary for this run: the newest stored review time, or
/// `now - lookback_days` when the destination is empty.
#[must_use]
pub fn resolve_watermark(
    stored: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> DateTime<Utc> {
    stored.unwrap_or_else(|| lookback_start(now, lookback_days))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn stored_maximum_wins() {
        let t3 = Utc.with_ymd_and_hms(2025, 10, 9, 3, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap();
        assert_eq!(resolve_watermark(Some(t3), now, 30), t3);
    }

    #[test]
    fn empty_destination_falls_back_to_lookback() {
        let now = Utc.with_ymd_and_hms(2025, 10, 31, 12, 0, 0).unwrap();
        assert_eq!(
            resolve_watermark(None, now, 30),
            Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
        );
    }
}
