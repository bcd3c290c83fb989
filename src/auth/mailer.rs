//! Verification email delivery.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::SmtpSettings;
use crate::error::MailError;

/// Sends verification links. Behind a trait so tests can capture the link
/// instead of talking to an SMTP server.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError>;
}

/// SMTP mailer backed by lettre.
pub struct LettreMailer {
    settings: SmtpSettings,
}

impl LettreMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError> {
        let settings = self.settings.clone();
        let to = to.to_string();
        let link = link.to_string();

        // lettre's SmtpTransport is blocking.
        tokio::task::spawn_blocking(move || send_blocking(&settings, &to, &link))
            .await
            .map_err(|e| MailError::Send(format!("Mailer task failed: {e}")))?
    }
}

fn send_blocking(settings: &SmtpSettings, to: &str, link: &str) -> Result<(), MailError> {
    let from: Mailbox =
        settings
            .from_address
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: settings.from_address.clone(),
                reason: e.to_string(),
            })?;
    let to_mailbox: Mailbox =
        to.parse()
            .map_err(|e: lettre::address::AddressError| MailError::InvalidAddress {
                address: to.to_string(),
                reason: e.to_string(),
            })?;

    let message = Message::builder()
        .from(from)
        .to(to_mailbox)
        .subject("Verify your email for GuideBuoy AI")
        .body(format!(
            "Hello,\n\n\
             Click the link below to verify your email and continue:\n\n\
             {link}\n\n\
             If you did not request this, you can ignore this email.\n"
        ))
        .map_err(|e| MailError::Build(e.to_string()))?;

    let creds = Credentials::new(settings.username.clone(), settings.password.clone());
    let transport = SmtpTransport::relay(&settings.host)
        .map_err(|e| MailError::Send(e.to_string()))?
        .port(settings.port)
        .credentials(creds)
        .build();

    transport
        .send(&message)
        .map_err(|e| MailError::Send(e.to_string()))?;
    Ok(())
}

/// Stand-in used when SMTP is not configured: logs the link instead of
/// sending it, so local flows stay testable.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError> {
        info!(%to, %link, "SMTP not configured, verification link logged only");
        Ok(())
    }
}
