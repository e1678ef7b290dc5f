//! The ingestion unit of work: watermark → fetch → transform → merge →
//! metadata snapshot.
//!
//! Errors propagate unchanged to the caller. Nothing in this crate records
//! run outcomes; that is the reporter's job.

pub mod error;
pub mod run;
pub mod snapshot;
pub mod store;
pub mod watermark;

pub use error::{IngestError, IngestFailure};
pub use run::{run_configured_ingestion, run_ingestion, IngestSummary};
pub use snapshot::snapshot_metadata;
pub use store::{PgReviewStore, ReviewStore};
pub use watermark::resolve_watermark;
