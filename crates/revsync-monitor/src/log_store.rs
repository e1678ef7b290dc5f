use async_trait::async_trait;
use revsync_core::{AppConfig, RunLogEntry};
use revsync_db::DbError;
use sqlx::PgPool;

/// Where run-log rows are read from and written to.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    /// `rows_loaded` of the most recent successful run of `task_name`.
    async fn previous_success_rows(&self, task_name: &str) -> Result<Option<u64>, DbError>;

    /// Append one run-log row.
    async fn record(&self, entry: &RunLogEntry) -> Result<(), DbError>;
}

/// Postgres [`RunLogStore`]. Each call opens its own pool and closes it
/// before returning, whatever the outcome.
pub struct PgRunLog {
    config: AppConfig,
}

impl PgRunLog {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    async fn open(&self) -> Result<PgPool, DbError> {
        let pool = revsync_db::connect_pool_from_config(&self.config).await?;
        if let Err(e) = revsync_db::ensure_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(pool)
    }
}

#[async_trait]
impl RunLogStore for PgRunLog {
    async fn previous_success_rows(&self, task_name: &str) -> Result<Option<u64>, DbError> {
        let pool = self.open().await?;
        let result = revsync_db::last_successful_rows_loaded(&pool, task_name).await;
        pool.close().await;
        result
    }

    async fn record(&self, entry: &RunLogEntry) -> Result<(), DbError> {
        let pool = self.open().await?;
        let result = revsync_db::insert_run_log(&pool, entry).await;
        pool.close().await;
        result.map(|_| ())
    }
}
