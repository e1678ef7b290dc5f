//! Standalone ingestion entry point.
//!
//! The row count line is printed on failure as well, so a parent process
//! that only reads stdout still sees the last known value.

use std::process::ExitCode;

use revsync_core::AppConfig;
use revsync_ingest::run_configured_ingestion;

pub(crate) fn rows_loaded_line(rows_loaded: u64) -> String {
    format!("ROWS_LOADED={rows_loaded}")
}

pub(crate) async fn run_ingest(config: &AppConfig) -> ExitCode {
    match run_configured_ingestion(config).await {
        Ok(summary) => {
            tracing::info!(
                rows_loaded = summary.rows_loaded,
                merged = summary.merged,
                watermark = %summary.watermark,
                "ingestion complete"
            );
            println!("{}", rows_loaded_line(summary.rows_loaded));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            let rows_loaded = failure.rows_loaded;
            let error = anyhow::Error::new(failure);
            tracing::error!(error = format!("{error:#}"), "ingestion failed");
            println!("{}", rows_loaded_line(rows_loaded));
            ExitCode::FAILURE
        }
    }
}
