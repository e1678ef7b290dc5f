//! Volume anomaly detection against the previous successful run.

use revsync_core::AnomalyFlag;

/// A run loading less than `1 / WARNING_DIVISOR` of the previous successful
/// run's rows is a warning. Compared in integers so the 20% boundary is exact.
const WARNING_DIVISOR: u128 = 5;

/// Classify `current` against the previous successful run's `rows_loaded`.
///
/// No previous run, or a previous count of zero, is `FIRST_RUN`. Zero rows
/// after a positive baseline is a warning, not `OK`.
#[must_use]
pub fn classify(previous: Option<u64>, current: u64) -> AnomalyFlag {
    match previous {
        None | Some(0) => AnomalyFlag::FirstRun,
        Some(previous) => {
            if u128::from(current) * WARNING_DIVISOR < u128::from(previous) {
                AnomalyFlag::Warning(format!(
                    "rows loaded dropped to {current} from {previous} in the previous successful run (below 20%)"
                ))
            } else {
                AnomalyFlag::Ok
            }
        }
    }
}
