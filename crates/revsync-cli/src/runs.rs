use revsync_core::AppConfig;
use revsync_db::RunLogRow;

pub(crate) fn format_run_row(row: &RunLogRow) -> String {
    let anomaly = row
        .anomaly()
        .map_or_else(|| "-".to_owned(), |flag| flag.to_string());
    let error_line = if row.is_failure() {
        format!(
            "\n    error: {}",
            row.error_message.as_deref().unwrap_or("unknown error")
        )
    } else {
        String::new()
    };

    format!(
        "{}  {:<7}  rows={:<6} {:>8.2}s  {}  {}{}",
        row.event_ts.format("%Y-%m-%d %H:%M:%S"),
        row.status,
        row.rows_loaded,
        row.duration_sec,
        anomaly,
        row.task_name,
        error_line,
    )
}

pub(crate) async fn print_runs(config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let pool = revsync_db::connect_pool_from_config(config).await?;
    let rows = match revsync_db::ensure_schema(&pool).await {
        Ok(()) => revsync_db::list_run_logs(&pool, limit).await,
        Err(e) => Err(e),
    };
    pool.close().await;
    let rows = rows?;

    if rows.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }
    for row in &rows {
        println!("{}", format_run_row(row));
    }
    Ok(())
}
