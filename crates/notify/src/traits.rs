//! Transport capability traits and shared error types.

use crate::preferences::SmtpSettings;

/// Errors that can occur while resolving preferences or delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Configuration error: {0}. Check the notify.json documentation")]
    Configuration(String),

    #[error(
        "Provider '{0}' not found. Check the notify.json documentation to see supported providers"
    )]
    UnsupportedProvider(String),

    #[error("Google Chat webhook URL not found. Check the notify.json documentation")]
    WebhookConfig,

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    WebhookStatus { status: u16, body: String },

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl NotifyError {
    /// Whether the error was raised before any network call was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NotifyError::Configuration(_)
                | NotifyError::UnsupportedProvider(_)
                | NotifyError::WebhookConfig
        )
    }
}

/// Sends a literal message body over one SMTP session.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `body` from `settings.sender_email` to `to`.
    ///
    /// The session is opened and closed inside this call.
    async fn send_mail(
        &self,
        settings: &SmtpSettings,
        to: &str,
        body: &str,
    ) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. `"email"`).
    fn channel_name(&self) -> &str;
}

/// POSTs a JSON document to a webhook URL.
#[async_trait::async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), NotifyError>;

    fn channel_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_point_at_docs() {
        let err = NotifyError::Configuration("missing 'email.port'".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: missing 'email.port'. Check the notify.json documentation"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn unsupported_provider_mentions_supported_providers() {
        let err = NotifyError::UnsupportedProvider("tracfone".into());
        let msg = err.to_string();
        assert!(msg.contains("tracfone"), "got: {msg}");
        assert!(msg.contains("supported providers"), "got: {msg}");
    }

    #[test]
    fn transport_errors_are_not_configuration() {
        assert!(!NotifyError::Smtp("auth failed".into()).is_configuration());
        assert!(!NotifyError::WebhookStatus {
            status: 500,
            body: String::new()
        }
        .is_configuration());
    }
}
