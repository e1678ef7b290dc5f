use chrono::{DateTime, Utc};
use revsync_core::AppConfig;
use revsync_feed::{
    collect_new_reviews, normalize_reviews, FeedClient, FeedQuery, FetchOptions,
    MetadataDefaults, ReviewFeed,
};

use crate::error::{IngestError, IngestFailure};
use crate::snapshot::snapshot_metadata;
use crate::store::{PgReviewStore, ReviewStore};
use crate::watermark::resolve_watermark;

/// What a successful ingestion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub watermark: DateTime<Utc>,
    /// Rows produced by the transformer and merged.
    pub rows_loaded: u64,
    /// Destination rows inserted or updated.
    pub merged: u64,
}

/// Runs the ingestion chain against the given feed and store.
///
/// Steps run strictly in order and the first error ends the run. The
/// failure carries the rows-loaded value known at that point.
///
/// # Errors
///
/// Returns [`IngestFailure`] wrapping the feed, store, or config error that
/// stopped the chain.
pub async fn run_ingestion<F, S>(
    config: &AppConfig,
    feed: &F,
    store: &S,
) -> Result<IngestSummary, IngestFailure>
where
    F: ReviewFeed + ?Sized,
    S: ReviewStore + ?Sized,
{
    let query = FeedQuery::from_app_config(config);

    let stored = store
        .latest_review_timestamp()
        .await
        .map_err(IngestFailure::before_load)?;
    let watermark = resolve_watermark(stored, Utc::now(), config.lookback_days);
    tracing::info!(
        app_id = %query.app_id,
        watermark = %watermark,
        from_store = stored.is_some(),
        "resolved watermark"
    );

    let raw = collect_new_reviews(feed, &query, watermark, FetchOptions::from_app_config(config))
        .await
        .map_err(IngestFailure::before_load)?;

    let rows = normalize_reviews(raw);
    let rows_loaded = u64::try_from(rows.len()).unwrap_or(u64::MAX);

    let outcome = store
        .merge_reviews(&rows, config.staging_chunk_size)
        .await
        .map_err(IngestFailure::before_load)?;
    tracing::info!(
        rows = rows_loaded,
        staged = outcome.staged,
        merged = outcome.merged,
        "reviews merged"
    );

    snapshot_metadata(
        feed,
        store,
        &query,
        &MetadataDefaults::from_app_config(config),
        Utc::now(),
    )
    .await
    .map_err(|e| IngestFailure::new(rows_loaded, e))?;

    Ok(IngestSummary {
        watermark,
        rows_loaded,
        merged: outcome.merged,
    })
}

/// Runs the chain against the configured HTTP feed and Postgres destination.
///
/// The pool is opened for this run only and closed before returning, on
/// every path.
///
/// # Errors
///
/// Returns [`IngestFailure`] if a required setting is missing, the store
/// cannot be reached, or any step of [`run_ingestion`] fails.
pub async fn run_configured_ingestion(config: &AppConfig) -> Result<IngestSummary, IngestFailure> {
    let feed = FeedClient::new(
        config
            .require_feed_base_url()
            .map_err(IngestFailure::before_load)?,
        config.feed_request_timeout_secs,
        &config.feed_user_agent,
    )
    .map_err(|e| IngestFailure::before_load(IngestError::Feed(e)))?;

    let store = PgReviewStore::connect(config)
        .await
        .map_err(IngestFailure::before_load)?;

    let result = run_ingestion(config, &feed, &store).await;
    store.close().await;
    result
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
