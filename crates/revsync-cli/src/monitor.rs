use std::process::ExitCode;

use revsync_core::{AppConfig, RunStatus};
use revsync_monitor::{
    report_run, AlertOutcome, EmbeddedInvoker, IngestInvoker, PgRunLog, SmtpAlerter,
    SubprocessInvoker, UnavailableInvoker,
};

use crate::InvokeMode;

/// Run one reporter-wrapped ingestion. Exits non-zero when the recorded
/// status is `FAILURE`. Every outcome, including a subprocess that cannot
/// be located, ends up in the run log.
pub(crate) async fn run_monitor(config: &AppConfig, mode: InvokeMode) -> ExitCode {
    let invoker = build_invoker(config, mode);
    let log = PgRunLog::new(config.clone());
    let alerts = SmtpAlerter::from_app_config(config);

    let report = report_run(&config.task_name, invoker.as_ref(), &log, &alerts).await;
    let entry = &report.entry;

    println!(
        "{} {} rows_loaded={} duration={:.2}s anomaly={}",
        entry.task_name,
        entry.status,
        entry.rows_loaded,
        entry.duration_secs,
        entry
            .anomaly
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string),
    );
    if !report.log_persisted {
        eprintln!("warning: the run log row could not be written; see logs above");
    }
    if report.alert == AlertOutcome::Failed {
        eprintln!("warning: the alert email could not be sent");
    }

    if entry.status == RunStatus::Failure {
        eprintln!("Run failed. Check the pipeline_monitoring table for error details.");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

pub(crate) fn build_invoker(config: &AppConfig, mode: InvokeMode) -> Box<dyn IngestInvoker> {
    match mode {
        InvokeMode::Embedded => Box::new(EmbeddedInvoker::new(config.clone())),
        InvokeMode::Subprocess => match SubprocessInvoker::current_exe() {
            Ok(invoker) => Box::new(invoker),
            Err(e) => Box::new(UnavailableInvoker::new(format!(
                "cannot locate the revsync executable: {e}"
            ))),
        },
    }
}
