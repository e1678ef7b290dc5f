use revsync_core::ConfigError;
use revsync_db::DbError;
use revsync_feed::FeedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error")]
    Config(#[from] ConfigError),
    #[error("review feed request failed")]
    Feed(#[from] FeedError),
    #[error("destination store operation failed")]
    Store(#[from] DbError),
}

/// A failed ingestion together with the rows-loaded count known when it
/// failed: 0 until the merge commits, the merged batch size afterwards.
///
/// Messages carry only their own layer; format with `{:#}` (via `anyhow`)
/// to see the full cause chain.
#[derive(Debug, Error)]
#[error("ingestion failed after {rows_loaded} rows loaded")]
pub struct IngestFailure {
    pub rows_loaded: u64,
    #[source]
    pub error: IngestError,
}

impl IngestFailure {
    #[must_use]
    pub fn new(rows_loaded: u64, error: impl Into<IngestError>) -> Self {
        Self {
            rows_loaded,
            error: error.into(),
        }
    }

    /// Failure before anything was committed.
    #[must_use]
    pub fn before_load(error: impl Into<IngestError>) -> Self {
        Self::new(0, error)
    }
}
