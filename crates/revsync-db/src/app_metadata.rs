//! Append-only inserts into `app_metadata`.

use revsync_core::AppMetadataRow;
use sqlx::PgPool;

use crate::DbError;

/// Append one listing snapshot. There is no key and no merge: every call
/// adds a row. Returns the generated `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_app_metadata(pool: &PgPool, row: &AppMetadataRow) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO app_metadata \
             (app_id, app_version, title, developer, genre, score, ratings_count, \
              reviews_count, installs, real_installs, is_free, price, currency, sale, \
              offers_iap, iap_price_range, url, fetched_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         RETURNING id",
    )
    .bind(&row.app_id)
    .bind(&row.app_version)
    .bind(&row.title)
    .bind(&row.developer)
    .bind(&row.genre)
    .bind(row.score)
    .bind(row.ratings_count)
    .bind(row.reviews_count)
    .bind(&row.installs)
    .bind(row.real_installs)
    .bind(row.is_free)
    .bind(row.price)
    .bind(&row.currency)
    .bind(row.sale)
    .bind(row.offers_iap)
    .bind(&row.iap_price_range)
    .bind(&row.url)
    .bind(row.fetched_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
