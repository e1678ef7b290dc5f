//! Database operations for the `pipeline_monitoring` run log.

use chrono::{DateTime, NaiveDate, Utc};
use revsync_core::{AnomalyFlag, RunLogEntry, RunStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{to_i64, DbError};

/// A row from the `pipeline_monitoring` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunLogRow {
    pub id: i64,
    pub run_id: Uuid,
    pub run_date: NaiveDate,
    pub task_name: String,
    pub status: String,
    pub rows_loaded: i64,
    pub error_message: Option<String>,
    pub duration_sec: f64,
    pub anomaly_flag: Option<String>,
    pub event_ts: DateTime<Utc>,
}

impl RunLogRow {
    /// `true` unless the stored status parses as `SUCCESS`.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.parse::<RunStatus>() != Ok(RunStatus::Success)
    }

    #[must_use]
    pub fn anomaly(&self) -> Option<AnomalyFlag> {
        self.anomaly_flag.as_deref().map(AnomalyFlag::from_stored)
    }
}

/// Appends one run-log row. Returns the generated `id`.
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if `rows_loaded` exceeds `BIGINT`, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_run_log(pool: &PgPool, entry: &RunLogEntry) -> Result<i64, DbError> {
    let rows_loaded = to_i64("rows_loaded", entry.rows_loaded)?;
    let anomaly_flag = entry.anomaly.as_ref().map(ToString::to_string);

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO pipeline_monitoring \
             (run_id, run_date, task_name, status, rows_loaded, error_message, \
              duration_sec, anomaly_flag, event_ts) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(entry.run_id)
    .bind(entry.run_date)
    .bind(&entry.task_name)
    .bind(entry.status.as_str())
    .bind(rows_loaded)
    .bind(&entry.error_message)
    .bind(entry.duration_secs)
    .bind(anomaly_flag)
    .bind(entry.logged_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// `rows_loaded` of the most recent `SUCCESS` run for `task_name`, or `None`
/// when there has never been one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn last_successful_rows_loaded(
    pool: &PgPool,
    task_name: &str,
) -> Result<Option<u64>, DbError> {
    let rows_loaded = sqlx::query_scalar::<_, i64>(
        "SELECT rows_loaded FROM pipeline_monitoring \
         WHERE task_name = $1 AND status = 'SUCCESS' \
         ORDER BY event_ts DESC, id DESC \
         LIMIT 1",
    )
    .bind(task_name)
    .fetch_optional(pool)
    .await?;

    Ok(rows_loaded.map(|n| u64::try_from(n).unwrap_or(0)))
}

/// Lists the most recent run-log rows, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_run_logs(pool: &PgPool, limit: i64) -> Result<Vec<RunLogRow>, DbError> {
    let rows = sqlx::query_as::<_, RunLogRow>(
        "SELECT id, run_id, run_date, task_name, status, rows_loaded, error_message, \
                duration_sec, anomaly_flag, event_ts \
         FROM pipeline_monitoring \
         ORDER BY event_ts DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
