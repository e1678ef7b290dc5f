use chrono::{DateTime, Utc};
use revsync_core::AppMetadataRow;
use revsync_feed::{normalize_metadata, FeedQuery, MetadataDefaults, ReviewFeed};

use crate::error::IngestError;
use crate::store::ReviewStore;

/// Fetch the current listing for `query.app_id` and append it as a new
/// snapshot stamped `fetched_at`.
///
/// # Errors
///
/// Returns [`IngestError::Feed`] if the lookup fails or
/// [`IngestError::Store`] if the insert fails.
pub async fn snapshot_metadata<F, S>(
    feed: &F,
    store: &S,
    query: &FeedQuery,
    defaults: &MetadataDefaults,
    fetched_at: DateTime<Utc>,
) -> Result<AppMetadataRow, IngestError>
where
    F: ReviewFeed + ?Sized,
    S: ReviewStore + ?Sized,
{
    let raw = feed.fetch_app_metadata(query).await?;
    let row = normalize_metadata(raw, &query.app_id, defaults, fetched_at);
    store.append_metadata(&row).await?;
    tracing::info!(
        app_id = %row.app_id,
        version = row.app_version.as_deref().unwrap_or("unknown"),
        "app metadata snapshot appended"
    );
    Ok(row)
}
