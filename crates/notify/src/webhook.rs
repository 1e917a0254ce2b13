//! Chat-space webhook transport.
//!
//! POSTs a JSON document to an incoming-webhook URL (Google Chat spaces accept
//! either `{"text": ...}` or a `cardsV2` card).

use std::time::Duration;

use crate::traits::{NotifyError, WebhookTransport};

/// Content type expected by Google Chat incoming webhooks.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Delivers JSON bodies over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl HttpWebhook {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client with a per-request deadline.
    pub fn with_timeout(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Default for HttpWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WebhookTransport for HttpWebhook {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(body)?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(%status, body = %body_text, "webhook returned non-2xx status");
            return Err(NotifyError::WebhookStatus {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::info!(channel = self.channel_name(), %status, "notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "chat"
    }
}
