use async_trait::async_trait;
use revsync_core::AppConfig;

use crate::error::FeedError;
use crate::types::{RawAppMetadata, ReviewPage};

/// Which app, in which locale, and how many reviews per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub app_id: String,
    pub lang: String,
    pub country: String,
    pub page_size: u32,
}

impl FeedQuery {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            lang: config.feed_lang.clone(),
            country: config.feed_country.clone(),
            page_size: config.feed_page_size,
        }
    }
}

/// The external review feed. Pages are delivered newest first.
#[async_trait]
pub trait ReviewFeed: Send + Sync {
    /// Fetches one page, starting from the newest when `cursor` is `None`.
    async fn fetch_reviews_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&str>,
    ) -> Result<ReviewPage, FeedError>;

    /// Fetches the current store listing for `query.app_id`.
    async fn fetch_app_metadata(&self, query: &FeedQuery) -> Result<RawAppMetadata, FeedError>;
}
