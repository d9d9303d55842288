//! Outbound alert channels.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use wayfarer_core::config::SosConfig;

use crate::error::SosError;

/// Delivers one text message to one phone number.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name recorded in delivery results.
    fn name(&self) -> &str;

    async fn send(&self, phone_number: &str, text: &str) -> Result<(), SosError>;
}

/// Posts `{"to", "message"}` JSON to a messaging gateway webhook.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>) -> Result<Self, SosError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SosError::Channel(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, phone_number: &str, text: &str) -> Result<(), SosError> {
        let payload = serde_json::json!({
            "to": phone_number,
            "message": text,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SosError::Channel(format!("Failed to reach alert gateway: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SosError::Channel(format!(
                "Alert gateway returned {}",
                response.status()
            )))
        }
    }
}

/// Degraded mode: logs the message it would have sent and reports success.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChannel;

#[async_trait]
impl AlertChannel for SimulatedChannel {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send(&self, phone_number: &str, text: &str) -> Result<(), SosError> {
        info!(to = %phone_number, chars = text.chars().count(), "SIMULATED alert message");
        info!("{}", text);
        Ok(())
    }
}

/// Webhook channel when a URL is configured, simulated otherwise.
pub fn channel_from_config(config: &SosConfig) -> Arc<dyn AlertChannel> {
    match config.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => match WebhookChannel::new(url) {
            Ok(channel) => Arc::new(channel),
            Err(e) => {
                warn!(error = %e, "Webhook channel unavailable, alerts will be simulated");
                Arc::new(SimulatedChannel)
            }
        },
        None => {
            warn!("No alert webhook configured, alerts will be simulated");
            Arc::new(SimulatedChannel)
        }
    }
}
