pub mod client;
pub mod error;
pub mod incremental;
pub mod normalize;
pub mod pagination;
pub mod source;
pub mod types;

pub use client::FeedClient;
pub use error::FeedError;
pub use incremental::{collect_new_reviews, new_review_pages, FetchOptions};
pub use normalize::{normalize_metadata, normalize_review, normalize_reviews, MetadataDefaults};
pub use pagination::PageCursor;
pub use source::{FeedQuery, ReviewFeed};
pub use types::{RawAppMetadata, RawReview, ReviewPage, ReviewsResponse};
