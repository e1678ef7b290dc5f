use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::FeedError;
use crate::source::{FeedQuery, ReviewFeed};
use crate::types::{RawAppMetadata, ReviewPage, ReviewsResponse};

/// Sort order requested from the feed. Incremental fetching depends on it.
const SORT_NEWEST: &str = "newest";

/// HTTP client for the review feed.
///
/// Maps 429, 404, and other non-2xx responses to typed errors. Nothing is
/// retried: the caller treats any error as fatal for the run.
pub struct FeedClient {
    client: Client,
    base_url: Url,
}

impl FeedClient {
    /// Creates a client with the configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`FeedError::InvalidBaseUrl`] if `base_url` does
    /// not parse as an absolute URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so joined segments append instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| FeedError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::InvalidBaseUrl {
                base_url: base_url.to_string(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self { client, base_url })
    }

    /// Builds `{base}/reviews?app_id=…&lang=…&country=…&sort=newest&count=…[&continuation_token=…]`.
    pub(crate) fn reviews_url(&self, query: &FeedQuery, cursor: Option<&str>) -> Url {
        let mut url = self.endpoint(&["reviews"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("app_id", &query.app_id)
                .append_pair("lang", &query.lang)
                .append_pair("country", &query.country)
                .append_pair("sort", SORT_NEWEST)
                .append_pair("count", &query.page_size.to_string());
            if let Some(token) = cursor {
                pairs.append_pair("continuation_token", token);
            }
        }
        url
    }

    /// Builds `{base}/apps/{app_id}?lang=…&country=…`.
    pub(crate) fn metadata_url(&self, query: &FeedQuery) -> Url {
        let mut url = self.endpoint(&["apps", &query.app_id]);
        url.query_pairs_mut()
            .append_pair("lang", &query.lang)
            .append_pair("country", &query.country);
        url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, FeedError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FeedError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| FeedError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl ReviewFeed for FeedClient {
    async fn fetch_reviews_page(
        &self,
        query: &FeedQuery,
        cursor: Option<&str>,
    ) -> Result<ReviewPage, FeedError> {
        let url = self.reviews_url(query, cursor);
        tracing::debug!(app_id = %query.app_id, has_cursor = cursor.is_some(), "requesting review page");
        let response: ReviewsResponse = self
            .get_json(url, &format!("reviews page for {}", query.app_id))
            .await?;
        Ok(response.into())
    }

    async fn fetch_app_metadata(&self, query: &FeedQuery) -> Result<RawAppMetadata, FeedError> {
        let url = self.metadata_url(query);
        self.get_json(url, &format!("app metadata for {}", query.app_id))
            .await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
