use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use revsync_db::DbError;

use super::*;
use crate::alert::{AlertError, AlertMessage};
use crate::invoke::{InvokeFailure, UnavailableInvoker};

// -----------------------------------------------------------------------
// Fakes
// -----------------------------------------------------------------------

struct ScriptedInvoker {
    result: Mutex<Option<Result<u64, InvokeFailure>>>,
}

impl ScriptedInvoker {
    fn ok(rows: u64) -> Self {
        Self {
            result: Mutex::new(Some(Ok(rows))),
        }
    }

    fn failing(rows_loaded: u64, message: &str) -> Self {
        Self {
            result: Mutex::new(Some(Err(InvokeFailure {
                rows_loaded,
                error: anyhow!(message.to_owned()),
            }))),
        }
    }
}

#[async_trait]
impl IngestInvoker for ScriptedInvoker {
    async fn invoke(&self) -> Result<u64, InvokeFailure> {
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("invoker called more than once")
    }
}

#[derive(Default)]
struct MemoryLog {
    previous: Option<u64>,
    baseline_fails: bool,
    record_fails: bool,
    entries: Mutex<Vec<RunLogEntry>>,
    record_calls: Mutex<usize>,
}

impl MemoryLog {
    fn with_previous(previous: u64) -> Self {
        Self {
            previous: Some(previous),
            ..Self::default()
        }
    }

    fn entries(&self) -> Vec<RunLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn record_calls(&self) -> usize {
        *self.record_calls.lock().unwrap()
    }
}

#[async_trait]
impl RunLogStore for MemoryLog {
    async fn previous_success_rows(&self, _task_name: &str) -> Result<Option<u64>, DbError> {
        if self.baseline_fails {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self.previous)
    }

    async fn record(&self, entry: &RunLogEntry) -> Result<(), DbError> {
        *self.record_calls.lock().unwrap() += 1;
        if self.record_fails {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingAlerts {
    fails: bool,
    sent: Mutex<Vec<AlertMessage>>,
}

impl RecordingAlerts {
    fn sent(&self) -> Vec<AlertMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSender for RecordingAlerts {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fails {
            return Err(AlertError::Config(revsync_core::ConfigError::MissingEnvVar(
                "REVSYNC_SMTP_HOST".to_owned(),
            )));
        }
        Ok(())
    }
}

const TASK: &str = "review_update";

// -----------------------------------------------------------------------
// report_run
// -----------------------------------------------------------------------

#[tokio::test]
async fn first_successful_run_is_logged_without_alert() {
    let log = MemoryLog::default();
    let alerts = RecordingAlerts::default();

    let report = report_run(TASK, &ScriptedInvoker::ok(5), &log, &alerts).await;

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.status, RunStatus::Success);
    assert_eq!(entry.rows_loaded, 5);
    assert_eq!(entry.anomaly, Some(AnomalyFlag::FirstRun));
    assert_eq!(entry.error_message, None);
    assert_eq!(entry.task_name, TASK);
    assert!(entry.duration_secs >= 0.0);
    assert_eq!(report.entry.run_id, entry.run_id);
    assert!(report.log_persisted);
    assert_eq!(report.alert, AlertOutcome::NotNeeded);
    assert!(alerts.sent().is_empty());
}

#[tokio::test]
async fn drop_below_twenty_percent_warns_and_alerts() {
    let log = MemoryLog::with_previous(100);
    let alerts = RecordingAlerts::default();

    let report = report_run(TASK, &ScriptedInvoker::ok(19), &log, &alerts).await;

    assert_eq!(report.entry.status, RunStatus::Success);
    assert!(report.entry.anomaly.as_ref().is_some_and(AnomalyFlag::is_warning));
    assert_eq!(report.alert, AlertOutcome::Dispatched);
    assert_eq!(alerts.sent().len(), 1);
}

#[tokio::test]
async fn exactly_twenty_percent_is_ok_and_quiet() {
    let log = MemoryLog::with_previous(100);
    let alerts = RecordingAlerts::default();

    let report = report_run(TASK, &ScriptedInvoker::ok(20), &log, &alerts).await;

    assert_eq!(report.entry.anomaly, Some(AnomalyFlag::Ok));
    assert_eq!(report.alert, AlertOutcome::NotNeeded);
}

#[tokio::test]
async fn zero_rows_after_positive_baseline_warns() {
    let log = MemoryLog::with_previous(40);
    let alerts = RecordingAlerts::default();

    let report = report_run(TASK, &ScriptedInvoker::ok(0), &log, &alerts).await;

    assert_eq!(report.entry.status, RunStatus::Success);
    assert!(report.entry.anomaly.as_ref().is_some_and(AnomalyFlag::is_warning));
    assert_eq!(alerts.sent().len(), 1);
}

#[tokio::test]
async fn feed_failure_logs_zero_rows_and_alerts() {
    let log = MemoryLog::default();
    let alerts = RecordingAlerts::default();
    let invoker = ScriptedInvoker::failing(0, "review feed request failed: HTTP request failed");

    let report = report_run(TASK, &invoker, &log, &alerts).await;

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, RunStatus::Failure);
    assert_eq!(entries[0].rows_loaded, 0);
    assert_eq!(
        entries[0].error_message.as_deref(),
        Some("review feed request failed: HTTP request failed")
    );
    assert!(entries[0].anomaly.is_some(), "anomaly is always set");
    assert_eq!(report.alert, AlertOutcome::Dispatched);
    assert!(alerts.sent()[0].subject.contains("FAILED"));
}

#[tokio::test]
async fn failure_after_merge_keeps_last_known_rows() {
    let log = MemoryLog::default();
    let invoker = ScriptedInvoker::failing(7, "metadata lookup failed");

    let report = report_run(TASK, &invoker, &log, &RecordingAlerts::default()).await;

    assert_eq!(report.entry.status, RunStatus::Failure);
    assert_eq!(report.entry.rows_loaded, 7);
}

#[tokio::test]
async fn invoker_that_cannot_start_is_still_logged_as_failure() {
    let log = MemoryLog::with_previous(40);
    let alerts = RecordingAlerts::default();
    let invoker = UnavailableInvoker::new("cannot locate the revsync executable: not found");

    let report = report_run(TASK, &invoker, &log, &alerts).await;

    assert_eq!(log.record_calls(), 1);
    let entries = log.entries();
    assert_eq!(entries[0].status, RunStatus::Failure);
    assert_eq!(entries[0].rows_loaded, 0);
    assert_eq!(
        entries[0].error_message.as_deref(),
        Some("cannot locate the revsync executable: not found")
    );
    assert_eq!(report.alert, AlertOutcome::Dispatched);
}

#[tokio::test]
async fn long_error_detail_is_truncated() {
    let log = MemoryLog::default();
    let invoker = ScriptedInvoker::failing(0, &"x".repeat(1000));

    report_run(TASK, &invoker, &log, &RecordingAlerts::default()).await;

    let stored = log.entries()[0].error_message.clone().unwrap();
    assert!(stored.chars().count() <= 804);
    assert!(stored.ends_with(" ..."));
}

#[tokio::test]
async fn log_write_failure_does_not_change_status_or_block_alert() {
    let log = MemoryLog {
        record_fails: true,
        ..MemoryLog::default()
    };
    let alerts = RecordingAlerts::default();
    let invoker = ScriptedInvoker::failing(0, "boom");

    let report = report_run(TASK, &invoker, &log, &alerts).await;

    assert_eq!(log.record_calls(), 1);
    assert!(!report.log_persisted);
    assert_eq!(report.entry.status, RunStatus::Failure);
    assert_eq!(report.alert, AlertOutcome::Dispatched);
}

#[tokio::test]
async fn alert_failure_is_not_fatal() {
    let log = MemoryLog::default();
    let alerts = RecordingAlerts {
        fails: true,
        ..RecordingAlerts::default()
    };

    let report = report_run(TASK, &ScriptedInvoker::failing(0, "boom"), &log, &alerts).await;

    assert_eq!(report.alert, AlertOutcome::Failed);
    assert!(report.log_persisted);
    assert_eq!(log.entries().len(), 1);
}

#[tokio::test]
async fn unreadable_baseline_still_logs_one_row_with_warning() {
    let log = MemoryLog {
        baseline_fails: true,
        ..MemoryLog::default()
    };

    let report = report_run(TASK, &ScriptedInvoker::ok(3), &log, &RecordingAlerts::default()).await;

    assert_eq!(log.entries().len(), 1);
    assert_eq!(report.entry.status, RunStatus::Success);
    assert!(report
        .entry
        .anomaly
        .as_ref()
        .is_some_and(|a| a.to_string().contains("baseline unavailable")));
}

// -----------------------------------------------------------------------
// truncate_error_detail
// -----------------------------------------------------------------------

#[test]
fn short_detail_is_unchanged() {
    assert_eq!(truncate_error_detail("boom"), "boom");
}

#[test]
fn detail_at_cap_is_unchanged() {
    let detail = "e".repeat(ERROR_DETAIL_CAP);
    assert_eq!(truncate_error_detail(&detail), detail);
}

#[test]
fn detail_over_cap_is_cut_with_marker() {
    let truncated = truncate_error_detail(&"e".repeat(1000));
    assert_eq!(truncated.chars().count(), 804);
    assert!(truncated.starts_with(&"e".repeat(800)));
    assert!(truncated.ends_with(" ..."));
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let truncated = truncate_error_detail(&"é".repeat(900));
    assert_eq!(truncated.chars().count(), 804);
}

#[test]
fn empty_detail_gets_placeholder() {
    assert_eq!(truncate_error_detail("  "), "unknown error");
}
