//! Value types for the append-only `pipeline_monitoring` run log.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(RunStatus::Success),
            "FAILURE" => Ok(RunStatus::Failure),
            other => Err(format!("unknown run status \"{other}\"")),
        }
    }
}

/// Volume classification of a run against the previous successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyFlag {
    Ok,
    FirstRun,
    /// Carries a human-readable explanation embedding both counts.
    Warning(String),
}

impl AnomalyFlag {
    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, AnomalyFlag::Warning(_))
    }

    /// Parse the stored column value back into a flag.
    ///
    /// Unknown text is kept as a warning so it is never silently read as `OK`.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        match raw {
            "OK" => AnomalyFlag::Ok,
            "FIRST_RUN" => AnomalyFlag::FirstRun,
            other => {
                let detail = other
                    .strip_prefix("WARNING")
                    .map(|rest| rest.trim_start_matches(':').trim())
                    .unwrap_or(other);
                AnomalyFlag::Warning(detail.to_string())
            }
        }
    }
}

impl std::fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyFlag::Ok => f.write_str("OK"),
            AnomalyFlag::FirstRun => f.write_str("FIRST_RUN"),
            AnomalyFlag::Warning(detail) if detail.is_empty() => f.write_str("WARNING"),
            AnomalyFlag::Warning(detail) => write!(f, "WARNING: {detail}"),
        }
    }
}

/// One row of the run log, written exactly once per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub task_name: String,
    pub status: RunStatus,
    pub rows_loaded: u64,
    /// Already truncated to the storage cap.
    pub error_message: Option<String>,
    pub duration_secs: f64,
    pub anomaly: Option<AnomalyFlag>,
    pub logged_at: DateTime<Utc>,
}
