//! Routes a message to the SMS gateway, email or chat channel.
//!
//! Preferences are re-resolved on every send, so edits to `notify.json` take
//! effect on the next call. Each send performs at most one outbound call and
//! configuration problems are reported before that call is attempted.

use std::sync::Arc;

use crate::card::{self, Payload, DEFAULT_HEADER};
use crate::email::SmtpMailer;
use crate::preferences::{FilePreferences, NotifyPreferences, PreferencesSource, SmsProvider};
use crate::traits::{MailTransport, NotifyError, WebhookTransport};
use crate::webhook::HttpWebhook;

/// Sends notifications using the channels described by the current preferences.
#[derive(Clone)]
pub struct Dispatcher {
    preferences: Arc<dyn PreferencesSource>,
    mailer: Arc<dyn MailTransport>,
    webhook: Arc<dyn WebhookTransport>,
}

impl Dispatcher {
    pub fn new(
        preferences: Arc<dyn PreferencesSource>,
        mailer: Arc<dyn MailTransport>,
        webhook: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            preferences,
            mailer,
            webhook,
        }
    }

    /// Dispatcher reading `notify.json` (or `BLANKLY_NOTIFY_PATH`) and using
    /// the SMTP and HTTP transports.
    pub fn from_env() -> Self {
        Self::new(
            Arc::new(FilePreferences::from_env()),
            Arc::new(SmtpMailer::new()),
            Arc::new(HttpWebhook::new()),
        )
    }

    /// Text `body` to the configured phone number via its carrier's email gateway.
    pub async fn send_text(&self, body: &str) -> Result<(), NotifyError> {
        let prefs = self.preferences.load()?;
        let text = prefs.text()?;
        let provider: SmsProvider = text.provider.parse()?;
        let destination = provider.gateway_address(&text.phone_number);

        tracing::debug!(
            channel = self.mailer.channel_name(),
            %provider,
            "sending text via email gateway"
        );
        self.deliver_email(&prefs, body, Some(&destination)).await
    }

    /// Email `body` to the configured receiver.
    pub async fn send_email(&self, body: &str) -> Result<(), NotifyError> {
        let prefs = self.preferences.load()?;
        self.deliver_email(&prefs, body, None).await
    }

    /// Post `message` to the configured chat webhook.
    ///
    /// Plain text and scalars are sent as `{"text": ...}`; structured payloads
    /// are rendered as a card titled `header` (default `"Message from Blankly"`).
    pub async fn send_chat(
        &self,
        message: impl Into<Payload>,
        header: Option<&str>,
    ) -> Result<(), NotifyError> {
        let message = message.into();
        let chat = self.preferences.load()?.chat()?;

        let body = chat_body(&message, header.unwrap_or(DEFAULT_HEADER))?;
        tracing::debug!(shape = message.shape(), "posting chat message");
        let result = self.webhook.post_json(&chat.webhook_url, &body).await;
        if let Err(e) = &result {
            tracing::warn!(
                channel = self.webhook.channel_name(),
                error = %e,
                "notification failed"
            );
        }
        result
    }

    async fn deliver_email(
        &self,
        prefs: &NotifyPreferences,
        body: &str,
        override_receiver: Option<&str>,
    ) -> Result<(), NotifyError> {
        let settings = prefs.email()?;
        let to = override_receiver.unwrap_or(&settings.receiver_email);
        let result = self.mailer.send_mail(&settings, to, body).await;
        if let Err(e) = &result {
            tracing::warn!(
                channel = self.mailer.channel_name(),
                error = %e,
                "notification failed"
            );
        }
        result
    }
}

/// Wire body for a chat message.
pub fn chat_body(message: &Payload, header: &str) -> Result<serde_json::Value, NotifyError> {
    let body = match message {
        Payload::Text(text) => serde_json::json!({ "text": text }),
        Payload::Scalar(value) => serde_json::json!({ "text": card::display_string(value) }),
        structured => card::render(header, structured).to_json()?,
    };
    Ok(body)
}
