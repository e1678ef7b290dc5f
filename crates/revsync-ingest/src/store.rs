use async_trait::async_trait;
use chrono::{DateTime, Utc};
use revsync_core::{AppConfig, AppMetadataRow, ReviewRow};
use revsync_db::{DbError, MergeOutcome};
use sqlx::PgPool;

/// The destination side of an ingestion run.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// `MAX(created_at)` over stored reviews, in UTC.
    async fn latest_review_timestamp(&self) -> Result<Option<DateTime<Utc>>, DbError>;

    /// Stage and merge `rows` by review id as one atomic unit.
    async fn merge_reviews(&self, rows: &[ReviewRow], chunk_size: usize)
        -> Result<MergeOutcome, DbError>;

    /// Append one metadata snapshot.
    async fn append_metadata(&self, row: &AppMetadataRow) -> Result<(), DbError>;
}

/// Postgres-backed [`ReviewStore`] owning a per-run pool.
///
/// Call [`PgReviewStore::close`] once the run is over, on success and
/// failure alike.
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    /// Connects and creates any missing destination tables.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if `DATABASE_URL` is missing, the connection
    /// fails, or the schema cannot be created. The pool is closed before a
    /// schema error is returned.
    pub async fn connect(config: &AppConfig) -> Result<Self, DbError> {
        let pool = revsync_db::connect_pool_from_config(config).await?;
        if let Err(e) = revsync_db::ensure_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn latest_review_timestamp(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        revsync_db::latest_review_timestamp(&self.pool).await
    }

    async fn merge_reviews(
        &self,
        rows: &[ReviewRow],
        chunk_size: usize,
    ) -> Result<MergeOutcome, DbError> {
        revsync_db::merge_reviews(&self.pool, rows, chunk_size).await
    }

    async fn append_metadata(&self, row: &AppMetadataRow) -> Result<(), DbError> {
        revsync_db::insert_app_metadata(&self.pool, row).await?;
        Ok(())
    }
}
