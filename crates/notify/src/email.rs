//! SMTP mail transport via `lettre`.
//!
//! Each send opens one authenticated TLS session, submits the body verbatim
//! (no MIME structuring) and closes the session. The transport is built per
//! call without pooling, so nothing outlives the send on any exit path.

use std::time::Duration;

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::preferences::SmtpSettings;
use crate::traits::{MailTransport, NotifyError};

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS from the first byte (SMTPS, usually port 465).
    Implicit,
    /// Plain connection upgraded with `STARTTLS` (ports 25 and 587).
    StartTls,
}

impl TlsMode {
    /// Implicit TLS unless the port is a well-known submission/relay port.
    pub fn for_port(port: u16) -> Self {
        match port {
            25 | 587 => TlsMode::StartTls,
            _ => TlsMode::Implicit,
        }
    }
}

fn parse_address(addr: &str, role: &str) -> Result<Address, NotifyError> {
    addr.trim().parse().map_err(|e: lettre::address::AddressError| {
        NotifyError::Configuration(format!("invalid {role} address '{addr}': {e}"))
    })
}

/// Build the SMTP envelope for a single recipient.
pub fn envelope(from: &str, to: &str) -> Result<Envelope, NotifyError> {
    let from = parse_address(from, "sender")?;
    let to = parse_address(to, "receiver")?;
    Envelope::new(Some(from), vec![to]).map_err(|e| NotifyError::Smtp(e.to_string()))
}

/// Sends mail through the server named in the `email` preferences.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer {
    timeout: Option<Duration>,
}

impl SmtpMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each SMTP command; `None` keeps lettre's default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport(
        &self,
        settings: &SmtpSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = match TlsMode::for_port(settings.port) {
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_server),
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
            }
        }
        .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        let mut builder = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.sender_email.clone(),
                settings.password.clone(),
            ));
        if self.timeout.is_some() {
            builder = builder.timeout(self.timeout);
        }
        Ok(builder.build())
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn send_mail(
        &self,
        settings: &SmtpSettings,
        to: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let envelope = envelope(&settings.sender_email, to)?;
        let transport = self.transport(settings)?;

        transport
            .send_raw(&envelope, body.as_bytes())
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = self.channel_name(),
            server = %settings.smtp_server,
            port = settings.port,
            bytes = body.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
