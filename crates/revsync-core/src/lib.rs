pub mod app_config;
pub mod config;
pub mod reviews;
pub mod run_log;
pub mod time;

pub use app_config::{AppConfig, SmtpTls};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use reviews::{AppMetadataRow, ReviewRow};
pub use run_log::{AnomalyFlag, RunLogEntry, RunStatus};
pub use time::{lookback_start, parse_event_time, round_secs};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
