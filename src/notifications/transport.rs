//! Push delivery transports

use super::types::NotificationIntent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Android notification channel registered by the mobile client
pub const ANDROID_CHANNEL_ID: &str = "circlesWay";

/// Something that can deliver one notification to a device
#[async_trait]
pub trait PushTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, intent: &NotificationIntent) -> Result<()>;
}

/// POSTs each intent as JSON to a push gateway.
///
/// The body follows the FCM v1 message shape so a thin relay can forward it as is.
#[derive(Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
}

impl WebhookTransport {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to create push gateway client")?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn payload(intent: &NotificationIntent) -> serde_json::Value {
        json!({
            "message": {
                "token": intent.address,
                "notification": {
                    "title": intent.title,
                    "body": intent.body,
                },
                "data": intent.data(),
                "android": {
                    "priority": "high",
                    "notification": {
                        "sound": "default",
                        "channel_id": ANDROID_CHANNEL_ID,
                    },
                },
            }
        })
    }
}

#[async_trait]
impl PushTransport for WebhookTransport {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, intent: &NotificationIntent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&Self::payload(intent))
            .send()
            .await
            .context("Push gateway request failed")?
            .error_for_status()
            .context("Push gateway rejected notification")?;
        Ok(())
    }
}

/// Logs intents instead of delivering them (no gateway configured)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl PushTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, intent: &NotificationIntent) -> Result<()> {
        info!(
            kind = intent.kind.as_str(),
            request_id = ?intent.request_id,
            title = %intent.title,
            "Notification (log transport)"
        );
        Ok(())
    }
}
