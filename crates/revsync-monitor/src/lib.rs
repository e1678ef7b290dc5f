//! Run Reporter: wraps one ingestion run, classifies its volume, writes
//! exactly one run-log row, and alerts on failure or anomaly.

pub mod alert;
pub mod anomaly;
pub mod invoke;
pub mod log_store;
pub mod report;

pub use alert::{build_alert, AlertError, AlertMessage, AlertSender, SmtpAlerter};
pub use anomaly::classify;
pub use invoke::{
    parse_rows_loaded, EmbeddedInvoker, IngestInvoker, InvokeFailure, SubprocessInvoker,
    UnavailableInvoker,
};
pub use log_store::{PgRunLog, RunLogStore};
pub use report::{report_run, truncate_error_detail, AlertOutcome, RunReport};
