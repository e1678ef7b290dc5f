//! The run reporter state machine.
//!
//! `RUNNING → SUCCESS | FAILURE`, then the log row is written and, for a
//! failure or a volume warning, an alert goes out. The invocation is the
//! only step whose error decides the status; baseline, log and alert
//! errors are reported to the operator and otherwise ignored.

use std::time::Instant;

use chrono::Utc;
use revsync_core::{round_secs, AnomalyFlag, RunLogEntry, RunStatus};
use tracing::Instrument;
use uuid::Uuid;

use crate::alert::{build_alert, AlertSender};
use crate::anomaly::classify;
use crate::invoke::IngestInvoker;
use crate::log_store::RunLogStore;

/// Stored error details are cut to this many characters.
pub const ERROR_DETAIL_CAP: usize = 800;
const TRUNCATION_MARKER: &str = " ...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    NotNeeded,
    Dispatched,
    Failed,
}

/// What the reporter recorded for one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub entry: RunLogEntry,
    pub log_persisted: bool,
    pub alert: AlertOutcome,
}

/// The run in flight. Only `finish` moves it to a terminal status.
struct Running {
    run_id: Uuid,
    started: Instant,
}

struct Finished {
    status: RunStatus,
    rows_loaded: u64,
    error_detail: Option<String>,
    duration_secs: f64,
}

impl Running {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }

    fn finish(&self, result: Result<u64, crate::invoke::InvokeFailure>) -> Finished {
        let duration_secs = round_secs(self.started.elapsed().as_secs_f64());
        match result {
            Ok(rows_loaded) => Finished {
                status: RunStatus::Success,
                rows_loaded,
                error_detail: None,
                duration_secs,
            },
            Err(failure) => {
                let detail = format!("{:#}", failure.error);
                tracing::error!(rows_loaded = failure.rows_loaded, error = %detail, "ingestion failed");
                Finished {
                    status: RunStatus::Failure,
                    rows_loaded: failure.rows_loaded,
                    error_detail: Some(truncate_error_detail(&detail)),
                    duration_secs,
                }
            }
        }
    }
}

/// Runs one ingestion through `invoker` and records the outcome.
///
/// Exactly one `record` call is made per invocation, whatever happened
/// before it. This function does not fail.
pub async fn report_run<I, L, A>(task_name: &str, invoker: &I, log: &L, alerts: &A) -> RunReport
where
    I: IngestInvoker + ?Sized,
    L: RunLogStore + ?Sized,
    A: AlertSender + ?Sized,
{
    let running = Running::start();
    let span = tracing::info_span!("run", run_id = %running.run_id, task = task_name);

    async move {
        let run_date = Utc::now().date_naive();
        tracing::info!("run started");

        let finished = running.finish(invoker.invoke().await);

        let anomaly = match log.previous_success_rows(task_name).await {
            Ok(previous) => classify(previous, finished.rows_loaded),
            Err(e) => {
                tracing::warn!(error = %e, "could not read previous run for anomaly baseline");
                AnomalyFlag::Warning(format!("baseline unavailable: {e}"))
            }
        };

        let entry = RunLogEntry {
            run_id: running.run_id,
            run_date,
            task_name: task_name.to_owned(),
            status: finished.status,
            rows_loaded: finished.rows_loaded,
            error_message: finished.error_detail,
            duration_secs: finished.duration_secs,
            anomaly: Some(anomaly),
            logged_at: Utc::now(),
        };

        tracing::info!(
            status = %entry.status,
            rows_loaded = entry.rows_loaded,
            duration_secs = entry.duration_secs,
            anomaly = %entry.anomaly.as_ref().map_or_else(String::new, ToString::to_string),
            "run finished"
        );

        let log_persisted = match log.record(&entry).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to persist run log entry");
                false
            }
        };

        let alert = if needs_alert(&entry) {
            match alerts.send(&build_alert(&entry)).await {
                Ok(()) => AlertOutcome::Dispatched,
                Err(e) => {
                    tracing::error!(error = %e, "failed to send alert");
                    AlertOutcome::Failed
                }
            }
        } else {
            AlertOutcome::NotNeeded
        };

        if entry.status == RunStatus::Failure {
            tracing::warn!("run failed; check the pipeline_monitoring table for error details");
        }

        RunReport {
            entry,
            log_persisted,
            alert,
        }
    }
    .instrument(span)
    .await
}

fn needs_alert(entry: &RunLogEntry) -> bool {
    entry.status == RunStatus::Failure || entry.anomaly.as_ref().is_some_and(AnomalyFlag::is_warning)
}

/// Caps `detail` at [`ERROR_DETAIL_CAP`] characters, marking the cut with
/// `" ..."`. An empty detail becomes a placeholder so failures are never
/// logged without one.
#[must_use]
pub fn truncate_error_detail(detail: &str) -> String {
    if detail.trim().is_empty() {
        return "unknown error".to_owned();
    }
    if detail.chars().count() <= ERROR_DETAIL_CAP {
        return detail.to_owned();
    }
    let mut truncated: String = detail.chars().take(ERROR_DETAIL_CAP).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
