//! Best-effort message delivery.
//!
//! Every message is logged locally. When a webhook is configured the message
//! is also posted to it once; failures are logged and dropped.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`. Never fails from the caller's point of view.
    async fn deliver(&self, message: &str);
}

/// Discord-compatible webhook body.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

pub struct WebhookNotifier {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// An empty or missing endpoint disables outbound delivery.
    pub fn new(endpoint: Option<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(endpoint, DELIVERY_TIMEOUT)
    }

    pub fn with_timeout(endpoint: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.filter(|url| !url.trim().is_empty()),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn post(&self, url: &str, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let response = self.client
            .post(url)
            .json(&WebhookPayload { content: message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("Webhook returned status: {}", response.status()).into());
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, message: &str) {
        tracing::info!("Notification: {}", message);

        let Some(url) = self.endpoint.as_deref() else {
            return;
        };

        match self.post(url, message).await {
            Ok(()) => tracing::debug!("Notification delivered to webhook"),
            Err(e) => tracing::warn!("Failed to deliver notification: {}", e),
        }
    }
}
