//! Incremental fetch: walk the feed from newest to oldest and stop at the
//! watermark.
//!
//! Pages arrive newest first, so the first page whose records are all at or
//! before the watermark proves every older page is too. The walk ends on
//! that page, on an empty page, or when the feed has no further cursor,
//! whichever comes first.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use revsync_core::AppConfig;

use crate::error::FeedError;
use crate::pagination::PageCursor;
use crate::source::{FeedQuery, ReviewFeed};
use crate::types::RawReview;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Courtesy pause before every request after the first. Not a backoff.
    pub inter_page_delay: Duration,
    /// Requests beyond this count fail with [`FeedError::PaginationLimit`].
    pub max_pages: usize,
}

impl FetchOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            inter_page_delay: Duration::from_millis(config.feed_inter_page_delay_ms),
            max_pages: config.feed_max_pages,
        }
    }
}

struct WalkState {
    cursor: PageCursor,
    pages: usize,
}

/// Lazily yields, page by page, the reviews strictly newer than `watermark`.
///
/// Each item is the filtered content of one feed page, in feed order. Errors
/// from the feed end the stream and are passed through unchanged.
pub fn new_review_pages<'a, F>(
    feed: &'a F,
    query: &'a FeedQuery,
    watermark: DateTime<Utc>,
    options: FetchOptions,
) -> impl Stream<Item = Result<Vec<RawReview>, FeedError>> + Send + 'a
where
    F: ReviewFeed + ?Sized,
{
    let initial = WalkState {
        cursor: PageCursor::Start,
        pages: 0,
    };

    stream::try_unfold(initial, move |mut state| async move {
        if state.cursor.is_exhausted() {
            return Ok(None);
        }
        if state.pages >= options.max_pages {
            return Err(FeedError::PaginationLimit {
                app_id: query.app_id.clone(),
                max_pages: options.max_pages,
            });
        }
        if state.pages > 0 && !options.inter_page_delay.is_zero() {
            tokio::time::sleep(options.inter_page_delay).await;
        }

        let page = feed
            .fetch_reviews_page(query, state.cursor.token())
            .await?;
        state.pages += 1;

        if page.reviews.is_empty() {
            tracing::debug!(page = state.pages, "feed returned an empty page");
            return Ok(None);
        }

        let fetched = page.reviews.len();
        let fresh: Vec<RawReview> = page
            .reviews
            .into_iter()
            .filter(|review| review.event_time().is_some_and(|at| at > watermark))
            .collect();

        tracing::debug!(
            page = state.pages,
            fetched,
            fresh = fresh.len(),
            "review page filtered against watermark"
        );

        if fresh.is_empty() {
            return Ok(None);
        }

        state.cursor = PageCursor::after(page.next_cursor);
        Ok(Some((fresh, state)))
    })
}

/// Drains [`new_review_pages`] into one vector, preserving feed order.
///
/// # Errors
///
/// Returns the first [`FeedError`] raised by the feed.
pub async fn collect_new_reviews<F>(
    feed: &F,
    query: &FeedQuery,
    watermark: DateTime<Utc>,
    options: FetchOptions,
) -> Result<Vec<RawReview>, FeedError>
where
    F: ReviewFeed + ?Sized,
{
    let reviews: Vec<RawReview> = new_review_pages(feed, query, watermark, options)
        .try_concat()
        .await?;
    tracing::info!(
        app_id = %query.app_id,
        watermark = %watermark,
        new_reviews = reviews.len(),
        "incremental fetch finished"
    );
    Ok(reviews)
}
