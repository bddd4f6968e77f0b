//! Outgoing mail. Handlers talk to `Arc<dyn Mailer>` so the SMTP relay can be
//! replaced by the log-only backend when no relay is configured.

pub mod templates;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::config::SmtpSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// Delivers through an authenticated STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .with_context(|| format!("Invalid SMTP relay '{}'", settings.host))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("Invalid MAIL_FROM address")?)
            .to(mail
                .to
                .parse()
                .with_context(|| format!("Invalid recipient '{}'", mail.to))?)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;

        info!("Sent '{}' to {}", mail.subject, mail.to);
        Ok(())
    }
}

/// Used when SMTP is not configured. Bodies may contain codes, so they only go to debug.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!("Mail (not delivered) to {}: {}", mail.to, mail.subject);
        debug!("Mail body:\n{}", mail.body);
        Ok(())
    }
}
