use crate::app_config::{AppConfig, SmtpTls};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials and endpoints are optional here and checked where they are
/// used (see [`AppConfig::require_database_url`] and friends), so a run with
/// a missing `DATABASE_URL` still gets far enough to report its own failure.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("REVSYNC_LOG_LEVEL", "info");
    let database_url = optional("DATABASE_URL");

    let db_max_connections = parse_u32("REVSYNC_DB_MAX_CONNECTIONS", "2")?;
    let db_min_connections = parse_u32("REVSYNC_DB_MIN_CONNECTIONS", "0")?;
    let db_acquire_timeout_secs = parse_u64("REVSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let app_id = or_default("REVSYNC_APP_ID", "com.openai.chatgpt");
    let feed_lang = or_default("REVSYNC_FEED_LANG", "en");
    let feed_country = or_default("REVSYNC_FEED_COUNTRY", "us");
    let feed_base_url = optional("REVSYNC_FEED_BASE_URL");

    let feed_page_size = parse_u32("REVSYNC_FEED_PAGE_SIZE", "200")?;
    if feed_page_size == 0 {
        return Err(invalid("REVSYNC_FEED_PAGE_SIZE", "must be at least 1".into()));
    }
    let feed_inter_page_delay_ms = parse_u64("REVSYNC_FEED_INTER_PAGE_DELAY_MS", "200")?;
    let feed_max_pages = parse_usize("REVSYNC_FEED_MAX_PAGES", "5000")?;
    let feed_request_timeout_secs = parse_u64("REVSYNC_FEED_REQUEST_TIMEOUT_SECS", "30")?;
    let feed_user_agent = or_default("REVSYNC_FEED_USER_AGENT", "revsync/0.1 (review-ingest)");

    let lookback_days = or_default("REVSYNC_LOOKBACK_DAYS", "30")
        .parse::<i64>()
        .map_err(|e| invalid("REVSYNC_LOOKBACK_DAYS", e.to_string()))?;
    if lookback_days < 0 {
        return Err(invalid("REVSYNC_LOOKBACK_DAYS", "must not be negative".into()));
    }

    let staging_chunk_size = parse_usize("REVSYNC_STAGING_CHUNK_SIZE", "200000")?;
    if staging_chunk_size == 0 {
        return Err(invalid("REVSYNC_STAGING_CHUNK_SIZE", "must be at least 1".into()));
    }

    let task_name = or_default("REVSYNC_TASK_NAME", "review_update");
    let metadata_default_developer = or_default("REVSYNC_METADATA_DEFAULT_DEVELOPER", "OpenAI");
    let metadata_default_genre = or_default("REVSYNC_METADATA_DEFAULT_GENRE", "Productivity");

    let smtp_host = optional("REVSYNC_SMTP_HOST");
    let smtp_port = optional("REVSYNC_SMTP_PORT")
        .map(|raw| {
            raw.parse::<u16>()
                .map_err(|e| invalid("REVSYNC_SMTP_PORT", e.to_string()))
        })
        .transpose()?;
    let smtp_username = optional("REVSYNC_SMTP_USERNAME");
    let smtp_password = optional("REVSYNC_SMTP_PASSWORD");
    let smtp_tls = parse_smtp_tls(&or_default("REVSYNC_SMTP_TLS", "starttls"))?;
    let alert_from = or_default("REVSYNC_ALERT_FROM", "revsync@localhost");
    let alert_recipients = parse_recipients(&or_default("REVSYNC_ALERT_RECIPIENTS", ""));

    Ok(AppConfig {
        database_url,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        app_id,
        feed_lang,
        feed_country,
        feed_base_url,
        feed_page_size,
        feed_inter_page_delay_ms,
        feed_max_pages,
        feed_request_timeout_secs,
        feed_user_agent,
        lookback_days,
        staging_chunk_size,
        task_name,
        metadata_default_developer,
        metadata_default_genre,
        smtp_host,
        smtp_port,
        smtp_username,
        smtp_password,
        smtp_tls,
        alert_from,
        alert_recipients,
    })
}

fn parse_smtp_tls(s: &str) -> Result<SmtpTls, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "starttls" => Ok(SmtpTls::StartTls),
        "tls" | "implicit" | "ssl" => Ok(SmtpTls::Implicit),
        "none" | "plain" => Ok(SmtpTls::None),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVSYNC_SMTP_TLS".to_string(),
            reason: format!("expected starttls, tls, or none; got \"{other}\""),
        }),
    }
}

/// Split a comma-separated recipient list, dropping blanks.
fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
