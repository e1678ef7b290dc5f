//! Wire types for the review feed.
//!
//! ## Observed shape
//!
//! ### `at`
//! Usually an ISO-8601 string without offset (the feed's clock is UTC), but
//! some mirrors emit RFC 3339 with an explicit offset or epoch seconds. The
//! raw JSON value is kept and interpreted by [`RawReview::event_time`].
//!
//! ### `score`
//! An integer star rating, occasionally serialized as a string or float by
//! proxies. Kept raw and coerced during normalization.
//!
//! ### `continuationToken`
//! Opaque. `null`, absent, and `""` all mean there are no further pages.

use chrono::{DateTime, Utc};
use revsync_core::parse_event_time;
use serde::Deserialize;
use serde_json::Value;

/// One review as delivered by the feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    /// Feed-assigned unique id, stable across re-fetch.
    pub review_id: String,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub score: Option<Value>,

    /// Creation time in whatever representation the feed used.
    #[serde(default)]
    pub at: Option<Value>,

    #[serde(default)]
    pub app_version: Option<String>,
}

impl RawReview {
    /// The creation timestamp in UTC, or `None` when missing or unparseable.
    #[must_use]
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.at.as_ref().and_then(parse_event_time)
    }
}

/// Top-level response from `GET /reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsResponse {
    #[serde(default)]
    pub reviews: Vec<RawReview>,

    #[serde(default)]
    pub continuation_token: Option<String>,
}

/// A page of reviews plus the cursor for the next (older) page.
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    pub reviews: Vec<RawReview>,
    pub next_cursor: Option<String>,
}

impl From<ReviewsResponse> for ReviewPage {
    fn from(response: ReviewsResponse) -> Self {
        Self {
            reviews: response.reviews,
            next_cursor: response.continuation_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Flat store-listing record from `GET /apps/{app_id}`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppMetadata {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub ratings: Option<i64>,
    #[serde(default)]
    pub reviews: Option<i64>,
    #[serde(default)]
    pub installs: Option<String>,
    #[serde(default)]
    pub real_installs: Option<i64>,
    #[serde(default)]
    pub free: Option<bool>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub sale: Option<bool>,
    #[serde(default, rename = "offersIAP")]
    pub offers_iap: Option<bool>,
    #[serde(default)]
    pub in_app_product_price: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
