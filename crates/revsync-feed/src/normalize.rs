//! Normalization from raw feed types to the storage rows in
//! [`revsync_core::reviews`].
//!
//! Nothing here fails: fields that cannot be interpreted become `NULL`, and
//! metadata gaps are filled from [`MetadataDefaults`].

use chrono::{DateTime, Utc};
use revsync_core::{AppConfig, AppMetadataRow, ReviewRow};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::types::{RawAppMetadata, RawReview};

/// Fallbacks for listing fields the feed may omit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDefaults {
    pub developer: String,
    pub genre: String,
}

impl MetadataDefaults {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            developer: config.metadata_default_developer.clone(),
            genre: config.metadata_default_genre.clone(),
        }
    }
}

/// Normalizes a batch of reviews, preserving order.
#[must_use]
pub fn normalize_reviews(reviews: Vec<RawReview>) -> Vec<ReviewRow> {
    reviews.into_iter().map(normalize_review).collect()
}

/// Normalizes one [`RawReview`] into a [`ReviewRow`].
#[must_use]
pub fn normalize_review(review: RawReview) -> ReviewRow {
    let created_at = review.event_time();
    ReviewRow {
        review_id: review.review_id,
        user_name: review.user_name,
        content: review.content,
        score: review.score.as_ref().and_then(coerce_score),
        created_at,
        app_version: review.app_version.filter(|v| !v.is_empty()),
    }
}

/// Builds a metadata snapshot row stamped with `fetched_at`.
#[must_use]
pub fn normalize_metadata(
    raw: RawAppMetadata,
    app_id: &str,
    defaults: &MetadataDefaults,
    fetched_at: DateTime<Utc>,
) -> AppMetadataRow {
    let url = raw
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| listing_url(app_id));

    AppMetadataRow {
        app_id: app_id.to_owned(),
        app_version: raw.version,
        title: raw.title,
        developer: raw
            .developer
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| defaults.developer.clone()),
        genre: raw
            .genre
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| defaults.genre.clone()),
        score: raw.score.filter(|s| s.is_finite()),
        ratings_count: raw.ratings,
        reviews_count: raw.reviews,
        installs: raw.installs,
        real_installs: raw.real_installs,
        is_free: raw.free,
        price: raw.price.and_then(|p| Decimal::try_from(p).ok()),
        currency: raw.currency,
        sale: raw.sale.unwrap_or(false),
        offers_iap: raw.offers_iap,
        iap_price_range: raw.in_app_product_price,
        url,
        fetched_at,
    }
}

/// Public store listing URL used when the feed omits one.
#[must_use]
pub fn listing_url(app_id: &str) -> String {
    format!("https://play.google.com/store/apps/details?id={app_id}")
}

/// Coerces a raw score to an integer star rating.
///
/// Integers pass through, floats are truncated, numeric strings are parsed.
/// Values outside `1..=5` are rejected.
fn coerce_score(value: &Value) -> Option<i16> {
    let stars = match value {
        Value::Number(n) => n.as_i64().or_else(|| truncate(n.as_f64()?)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| truncate(s.parse::<f64>().ok()?))
        }
        _ => None,
    }?;

    if (1..=5).contains(&stars) {
        i16::try_from(stars).ok()
    } else {
        None
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
