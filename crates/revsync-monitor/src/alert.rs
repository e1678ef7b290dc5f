//! One plain-text email per alerting run. No retry.

use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use revsync_core::{AppConfig, ConfigError, RunLogEntry, RunStatus, SmtpTls};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("mail relay is not configured")]
    Config(#[from] ConfigError),
    #[error("invalid mail address \"{address}\"")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build alert message")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP delivery failed")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), AlertError>;
}

/// Builds the alert for a finished run: status, rows, anomaly, duration and
/// error detail, plus where to look next.
#[must_use]
pub fn build_alert(entry: &RunLogEntry) -> AlertMessage {
    let subject = match entry.status {
        RunStatus::Failure => format!("[revsync] {} FAILED on {}", entry.task_name, entry.run_date),
        RunStatus::Success => format!(
            "[revsync] {} volume anomaly on {}",
            entry.task_name, entry.run_date
        ),
    };

    let anomaly = entry
        .anomaly
        .as_ref()
        .map_or_else(|| "-".to_owned(), ToString::to_string);

    let body = format!(
        "Task:        {task}\n\
         Run id:      {run_id}\n\
         Status:      {status}\n\
         Rows loaded: {rows}\n\
         Anomaly:     {anomaly}\n\
         Duration:    {duration:.2}s\n\
         Error:       {error}\n\
         \n\
         See the pipeline_monitoring table for the full run history.\n",
        task = entry.task_name,
        run_id = entry.run_id,
        status = entry.status,
        rows = entry.rows_loaded,
        duration = entry.duration_secs,
        error = entry.error_message.as_deref().unwrap_or("-"),
    );

    AlertMessage { subject, body }
}

/// SMTP [`AlertSender`]. With no recipients configured, sending is a no-op.
pub struct SmtpAlerter {
    config: AppConfig,
}

impl SmtpAlerter {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, AlertError> {
        let host = self.config.require_smtp_host()?;

        let mut builder = match self.config.smtp_tls {
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?,
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        if let Some(port) = self.config.smtp_port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(builder.build())
    }

    fn message(&self, alert: &AlertMessage) -> Result<Message, AlertError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.alert_from)?)
            .subject(alert.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.config.alert_recipients {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        Ok(builder.body(alert.body.clone())?)
    }
}

#[async_trait]
impl AlertSender for SmtpAlerter {
    async fn send(&self, alert: &AlertMessage) -> Result<(), AlertError> {
        if !self.config.alerts_enabled() {
            tracing::debug!("no alert recipients configured; skipping alert");
            return Ok(());
        }

        let message = self.message(alert)?;
        let transport = self.transport()?;
        transport.send(message).await?;
        tracing::info!(
            recipients = self.config.alert_recipients.len(),
            subject = %alert.subject,
            "alert sent"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, AlertError> {
    address.parse::<Mailbox>().map_err(|source| AlertError::Address {
        address: address.to_owned(),
        source,
    })
}
