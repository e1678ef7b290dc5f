use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::TimeDelta;
use revsync_core::{build_app_config, AppMetadataRow, ReviewRow};
use revsync_db::{DbError, MergeOutcome};
use revsync_feed::{FeedError, RawAppMetadata, RawReview, ReviewPage};
use serde_json::json;

use super::*;

// -----------------------------------------------------------------------
// Fakes
// -----------------------------------------------------------------------

/// Feed double: pages served newest first, all with an exhausted cursor
/// after the last one.
#[derive(Default)]
struct FakeFeed {
    pages: Mutex<VecDeque<Result<ReviewPage, FeedError>>>,
    page_requests: Mutex<usize>,
    metadata_fails: bool,
}

impl FakeFeed {
    fn with_pages(pages: Vec<Vec<RawReview>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, reviews)| {
                Ok(ReviewPage {
                    reviews,
                    next_cursor: (i + 1 < count).then(|| format!("page-{}", i + 2)),
                })
            })
            .collect();
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            pages: Mutex::new(VecDeque::from([Err(FeedError::UnexpectedStatus {
                status: 502,
                url: "http://feed/reviews".to_owned(),
            })])),
            ..Self::default()
        }
    }

    fn page_requests(&self) -> usize {
        *self.page_requests.lock().unwrap()
    }
}

#[async_trait]
impl ReviewFeed for FakeFeed {
    async fn fetch_reviews_page(
        &self,
        _query: &FeedQuery,
        _cursor: Option<&str>,
    ) -> Result<ReviewPage, FeedError> {
        *self.page_requests.lock().unwrap() += 1;
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ReviewPage::default()))
    }

    async fn fetch_app_metadata(&self, query: &FeedQuery) -> Result<RawAppMetadata, FeedError> {
        if self.metadata_fails {
            return Err(FeedError::NotFound {
                url: format!("http://feed/apps/{}", query.app_id),
            });
        }
        Ok(RawAppMetadata {
            version: Some("1.2025.280".to_owned()),
            title: Some("ChatGPT".to_owned()),
            ..RawAppMetadata::default()
        })
    }
}

/// In-memory destination with merge-by-key semantics.
#[derive(Default)]
struct MemoryStore {
    reviews: Mutex<BTreeMap<String, ReviewRow>>,
    metadata: Mutex<Vec<AppMetadataRow>>,
    merge_fails: bool,
}

impl MemoryStore {
    fn seeded(rows: Vec<ReviewRow>) -> Self {
        Self {
            reviews: Mutex::new(rows.into_iter().map(|r| (r.review_id.clone(), r)).collect()),
            ..Self::default()
        }
    }

    fn review_count(&self) -> usize {
        self.reviews.lock().unwrap().len()
    }

    fn metadata_count(&self) -> usize {
        self.metadata.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn latest_review_timestamp(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .values()
            .filter_map(|r| r.created_at)
            .max())
    }

    async fn merge_reviews(
        &self,
        rows: &[ReviewRow],
        _chunk_size: usize,
    ) -> Result<MergeOutcome, DbError> {
        if self.merge_fails {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let mut reviews = self.reviews.lock().unwrap();
        for row in rows {
            reviews.insert(row.review_id.clone(), row.clone());
        }
        let n = rows.len() as u64;
        Ok(MergeOutcome { staged: n, merged: n })
    }

    async fn append_metadata(&self, row: &AppMetadataRow) -> Result<(), DbError> {
        self.metadata.lock().unwrap().push(row.clone());
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn config() -> AppConfig {
    let mut config = build_app_config(|_| Err(std::env::VarError::NotPresent)).unwrap();
    config.feed_inter_page_delay_ms = 0;
    config
}

fn raw_review(id: &str, at: DateTime<Utc>) -> RawReview {
    RawReview {
        review_id: id.to_owned(),
        user_name: Some("A Google user".to_owned()),
        content: Some("Helpful".to_owned()),
        score: Some(json!(5)),
        at: Some(json!(at.to_rfc3339())),
        app_version: Some("1.2025.280".to_owned()),
    }
}

fn stored_review(id: &str, at: DateTime<Utc>) -> ReviewRow {
    ReviewRow {
        review_id: id.to_owned(),
        user_name: None,
        content: Some("old".to_owned()),
        score: Some(3),
        created_at: Some(at),
        app_version: None,
    }
}

// -----------------------------------------------------------------------
// run_ingestion
// -----------------------------------------------------------------------

#[tokio::test]
async fn empty_destination_loads_first_page_and_snapshots_metadata() {
    let now = Utc::now();
    let feed = FakeFeed::with_pages(vec![(0..5)
        .map(|i| raw_review(&format!("r{i}"), now - TimeDelta::hours(i + 1)))
        .collect()]);
    let store = MemoryStore::default();

    let summary = run_ingestion(&config(), &feed, &store).await.unwrap();

    assert_eq!(summary.rows_loaded, 5);
    assert_eq!(store.review_count(), 5);
    assert_eq!(store.metadata_count(), 1);
    assert_eq!(feed.page_requests(), 1, "exhausted cursor ends the walk");

    let expected = now - TimeDelta::days(30);
    let drift = (summary.watermark - expected).num_seconds().abs();
    assert!(drift < 60, "watermark should default to now - 30 days");
}

#[tokio::test]
async fn only_records_newer_than_stored_maximum_are_loaded() {
    let t3 = Utc::now() - TimeDelta::hours(10);
    let store = MemoryStore::seeded(vec![
        stored_review("t1", t3 - TimeDelta::hours(2)),
        stored_review("t2", t3 - TimeDelta::hours(1)),
        stored_review("t3", t3),
    ]);
    let feed = FakeFeed::with_pages(vec![vec![
        raw_review("new", t3 + TimeDelta::minutes(5)),
        raw_review("t3", t3),
        raw_review("t2", t3 - TimeDelta::hours(1)),
    ]]);

    let summary = run_ingestion(&config(), &feed, &store).await.unwrap();

    assert_eq!(summary.watermark, t3);
    assert_eq!(summary.rows_loaded, 1);
    assert_eq!(store.review_count(), 4);
}

#[tokio::test]
async fn repeat_run_loads_nothing_and_does_not_duplicate() {
    let now = Utc::now();
    let page = vec![
        raw_review("a", now - TimeDelta::hours(1)),
        raw_review("b", now - TimeDelta::hours(2)),
    ];
    let store = MemoryStore::default();

    let first = run_ingestion(&config(), &FakeFeed::with_pages(vec![page.clone()]), &store)
        .await
        .unwrap();
    let second = run_ingestion(&config(), &FakeFeed::with_pages(vec![page]), &store)
        .await
        .unwrap();

    assert_eq!(first.rows_loaded, 2);
    assert_eq!(second.rows_loaded, 0);
    assert_eq!(store.review_count(), 2);
    assert_eq!(store.metadata_count(), 2, "every run appends a snapshot");
}

#[tokio::test]
async fn empty_feed_is_zero_rows_not_an_error() {
    let feed = FakeFeed::with_pages(vec![vec![]]);
    let store = MemoryStore::default();

    let summary = run_ingestion(&config(), &feed, &store).await.unwrap();

    assert_eq!(summary.rows_loaded, 0);
    assert_eq!(store.review_count(), 0);
}

#[tokio::test]
async fn feed_failure_reports_zero_rows_and_leaves_store_untouched() {
    let feed = FakeFeed::failing();
    let store = MemoryStore::default();

    let failure = run_ingestion(&config(), &feed, &store).await.unwrap_err();

    assert_eq!(failure.rows_loaded, 0);
    assert!(matches!(failure.error, IngestError::Feed(_)));
    assert_eq!(store.review_count(), 0);
    assert_eq!(store.metadata_count(), 0);
}

#[tokio::test]
async fn merge_failure_reports_zero_rows() {
    let now = Utc::now();
    let feed = FakeFeed::with_pages(vec![vec![raw_review("a", now)]]);
    let store = MemoryStore {
        merge_fails: true,
        ..MemoryStore::default()
    };

    let failure = run_ingestion(&config(), &feed, &store).await.unwrap_err();

    assert_eq!(failure.rows_loaded, 0);
    assert!(matches!(failure.error, IngestError::Store(_)));
    assert_eq!(store.metadata_count(), 0, "snapshot never reached");
}

#[tokio::test]
async fn metadata_failure_keeps_merged_row_count() {
    let now = Utc::now();
    let mut feed = FakeFeed::with_pages(vec![vec![
        raw_review("a", now - TimeDelta::minutes(1)),
        raw_review("b", now - TimeDelta::minutes(2)),
        raw_review("c", now - TimeDelta::minutes(3)),
    ]]);
    feed.metadata_fails = true;
    let store = MemoryStore::default();

    let failure = run_ingestion(&config(), &feed, &store).await.unwrap_err();

    assert_eq!(failure.rows_loaded, 3);
    assert!(matches!(
        failure.error,
        IngestError::Feed(FeedError::NotFound { .. })
    ));
    assert_eq!(store.review_count(), 3, "merge already committed");
}

// -----------------------------------------------------------------------
// run_configured_ingestion
// -----------------------------------------------------------------------

#[tokio::test]
async fn missing_feed_url_fails_before_touching_the_store() {
    let failure = run_configured_ingestion(&config()).await.unwrap_err();

    assert_eq!(failure.rows_loaded, 0);
    assert!(
        matches!(failure.error, IngestError::Config(_)),
        "expected a config error, got: {failure}"
    );
}

#[tokio::test]
async fn missing_database_url_is_a_store_error() {
    let mut config = config();
    config.feed_base_url = Some("http://127.0.0.1:9".to_owned());

    let failure = run_configured_ingestion(&config).await.unwrap_err();

    assert!(matches!(
        failure.error,
        IngestError::Store(DbError::Config(_))
    ));
}
