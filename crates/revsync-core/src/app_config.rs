use crate::ConfigError;

/// Transport security for the outbound mail relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Plain connection upgraded with `STARTTLS` (usually port 587).
    StartTls,
    /// Implicit TLS from the first byte (usually port 465).
    Implicit,
    /// Unencrypted; only for local relays and tests.
    None,
}

impl std::fmt::Display for SmtpTls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmtpTls::StartTls => write!(f, "starttls"),
            SmtpTls::Implicit => write!(f, "tls"),
            SmtpTls::None => write!(f, "none"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub app_id: String,
    pub feed_lang: String,
    pub feed_country: String,
    pub feed_base_url: Option<String>,
    pub feed_page_size: u32,
    pub feed_inter_page_delay_ms: u64,
    pub feed_max_pages: usize,
    pub feed_request_timeout_secs: u64,
    pub feed_user_agent: String,
    pub lookback_days: i64,
    pub staging_chunk_size: usize,
    pub task_name: String,
    pub metadata_default_developer: String,
    pub metadata_default_genre: String,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: SmtpTls,
    pub alert_from: String,
    pub alert_recipients: Vec<String>,
}

impl AppConfig {
    /// The destination store URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// The review feed endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `REVSYNC_FEED_BASE_URL` was not set.
    pub fn require_feed_base_url(&self) -> Result<&str, ConfigError> {
        self.feed_base_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("REVSYNC_FEED_BASE_URL".to_string()))
    }

    /// The outbound mail relay host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `REVSYNC_SMTP_HOST` was not set.
    pub fn require_smtp_host(&self) -> Result<&str, ConfigError> {
        self.smtp_host
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("REVSYNC_SMTP_HOST".to_string()))
    }

    /// Alerts are only dispatched when at least one recipient is configured.
    #[must_use]
    pub fn alerts_enabled(&self) -> bool {
        !self.alert_recipients.is_empty()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("app_id", &self.app_id)
            .field("feed_lang", &self.feed_lang)
            .field("feed_country", &self.feed_country)
            .field("feed_base_url", &self.feed_base_url)
            .field("feed_page_size", &self.feed_page_size)
            .field("feed_inter_page_delay_ms", &self.feed_inter_page_delay_ms)
            .field("feed_max_pages", &self.feed_max_pages)
            .field("feed_request_timeout_secs", &self.feed_request_timeout_secs)
            .field("feed_user_agent", &self.feed_user_agent)
            .field("lookback_days", &self.lookback_days)
            .field("staging_chunk_size", &self.staging_chunk_size)
            .field("task_name", &self.task_name)
            .field(
                "metadata_default_developer",
                &self.metadata_default_developer,
            )
            .field("metadata_default_genre", &self.metadata_default_genre)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "[redacted]"),
            )
            .field("smtp_tls", &self.smtp_tls)
            .field("alert_from", &self.alert_from)
            .field("alert_recipients", &self.alert_recipients)
            .finish()
    }
}
