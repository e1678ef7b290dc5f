//! Watermark query and staged merge for the `reviews` table.

use chrono::{DateTime, Utc};
use revsync_core::ReviewRow;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Counts reported by [`merge_reviews`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rows written to the staging table across all chunks.
    pub staged: u64,
    /// Destination rows inserted or updated by the merge.
    pub merged: u64,
}

/// Returns `MAX(created_at)` over `reviews`, or `None` when the table is empty.
///
/// The value is cast to `timestamptz`; with the session pinned to UTC a
/// legacy zone-less column is read as UTC as well.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_review_timestamp(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(created_at)::timestamptz FROM reviews",
    )
    .fetch_one(pool)
    .await?;
    Ok(latest)
}

/// Stage `rows` and merge them into `reviews` by `review_id`, all in one
/// transaction.
///
/// The staging table is a `TEMP` copy of the destination shape dropped on
/// commit, so a failure anywhere (including mid-chunk) rolls back with no
/// destination change and leaves nothing behind. Rows are staged in chunks
/// of `chunk_size` via `UNNEST` so no statement exceeds the bind limit.
///
/// Existing ids get `content`, `score`, `created_at` and `app_version`
/// overwritten; new ids are inserted. When the batch repeats an id, the copy
/// with the latest `created_at` wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back when dropped.
pub async fn merge_reviews(
    pool: &PgPool,
    rows: &[ReviewRow],
    chunk_size: usize,
) -> Result<MergeOutcome, DbError> {
    if rows.is_empty() {
        return Ok(MergeOutcome::default());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "CREATE TEMP TABLE reviews_staging (LIKE reviews INCLUDING DEFAULTS) ON COMMIT DROP",
    )
    .execute(&mut *tx)
    .await?;

    let mut staged = 0_u64;
    for (index, chunk) in rows.chunks(chunk_size.max(1)).enumerate() {
        let written = stage_chunk(&mut tx, chunk).await?;
        tracing::debug!(chunk = index + 1, rows = written, "staged review chunk");
        staged += written;
    }

    let merged = sqlx::query(
        "INSERT INTO reviews (review_id, user_name, content, score, created_at, app_version) \
         SELECT DISTINCT ON (review_id) \
                review_id, user_name, content, score, created_at, app_version \
         FROM reviews_staging \
         ORDER BY review_id, created_at DESC NULLS LAST \
         ON CONFLICT (review_id) DO UPDATE SET \
             content     = EXCLUDED.content, \
             score       = EXCLUDED.score, \
             created_at  = EXCLUDED.created_at, \
             app_version = EXCLUDED.app_version",
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    Ok(MergeOutcome { staged, merged })
}

async fn stage_chunk(conn: &mut PgConnection, chunk: &[ReviewRow]) -> Result<u64, DbError> {
    let mut review_ids: Vec<&str> = Vec::with_capacity(chunk.len());
    let mut user_names: Vec<Option<&str>> = Vec::with_capacity(chunk.len());
    let mut contents: Vec<Option<&str>> = Vec::with_capacity(chunk.len());
    let mut scores: Vec<Option<i16>> = Vec::with_capacity(chunk.len());
    let mut created_ats: Vec<Option<DateTime<Utc>>> = Vec::with_capacity(chunk.len());
    let mut app_versions: Vec<Option<&str>> = Vec::with_capacity(chunk.len());

    for row in chunk {
        review_ids.push(&row.review_id);
        user_names.push(row.user_name.as_deref());
        contents.push(row.content.as_deref());
        scores.push(row.score);
        created_ats.push(row.created_at);
        app_versions.push(row.app_version.as_deref());
    }

    let written = sqlx::query(
        "INSERT INTO reviews_staging \
             (review_id, user_name, content, score, created_at, app_version) \
         SELECT * FROM UNNEST(\
              $1::text[], $2::text[], $3::text[], $4::int2[], $5::timestamptz[], $6::text[])",
    )
    .bind(&review_ids)
    .bind(&user_names)
    .bind(&contents)
    .bind(&scores)
    .bind(&created_ats)
    .bind(&app_versions)
    .execute(conn)
    .await?
    .rows_affected();

    Ok(written)
}
