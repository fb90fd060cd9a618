use crate::{Alert, AlertType, NotificationChannel, NotificationError};
use async_trait::async_trait;

pub struct DiscordWebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordWebhookNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self { webhook_url: webhook_url.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl NotificationChannel for DiscordWebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let color = match &alert.alert_type {
            AlertType::TradeEntered { .. } => 0x3498db,
            AlertType::TradeExited { pnl, .. } | AlertType::TradeResolved { pnl, .. } => {
                if *pnl >= 0.0 {
                    0x2ecc71
                } else {
                    0xe74c3c
                }
            }
            AlertType::GuaranteedWinDetected { .. } => 0xf1c40f,
            AlertType::ScanSummary { .. } => 0x95a5a6,
            AlertType::CalibrationRebuilt { .. } => 0x9b59b6,
            AlertType::AgentError { .. } => 0xe74c3c,
        };

        let payload = serde_json::json!({
            "embeds": [{
                "title": alert.title,
                "description": alert.message,
                "color": color,
                "timestamp": alert.timestamp.to_rfc3339(),
            }]
        });

        self.client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Discord(e.to_string()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "discord-webhook"
    }
}
