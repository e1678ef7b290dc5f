//! Destination row shapes for reviews and app metadata snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A review normalized for storage. `review_id` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub review_id: String,
    pub user_name: Option<String>,
    pub content: Option<String>,
    /// Star rating in `1..=5`; anything else is stored as `NULL`.
    pub score: Option<i16>,
    /// Event time, always UTC.
    pub created_at: Option<DateTime<Utc>>,
    pub app_version: Option<String>,
}

/// One point-in-time snapshot of the store listing. Append-only, no key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMetadataRow {
    pub app_id: String,
    pub app_version: Option<String>,
    pub title: Option<String>,
    pub developer: String,
    pub genre: String,
    /// Average star rating across all ratings.
    pub score: Option<f64>,
    pub ratings_count: Option<i64>,
    pub reviews_count: Option<i64>,
    /// Install bucket as displayed, e.g. `"500,000,000+"`.
    pub installs: Option<String>,
    pub real_installs: Option<i64>,
    pub is_free: Option<bool>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub sale: bool,
    pub offers_iap: Option<bool>,
    pub iap_price_range: Option<String>,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}
