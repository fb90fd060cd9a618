mod discord;
mod queue;

pub use discord::DiscordWebhookNotifier;
pub use queue::AlertQueue;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events this engine raises notifications for. Immediate events are
/// awaited inline; everything else drains through the rate-limited queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertType {
    TradeEntered { city: String, range_name: String, side: String, shares: f64, cost: f64 },
    TradeExited { city: String, range_name: String, reason: String, pnl: f64 },
    TradeResolved { city: String, range_name: String, won: bool, pnl: f64 },
    GuaranteedWinDetected { city: String, range_name: String, observation_high: f64 },
    ScanSummary { city: String, entered: usize, filtered: usize },
    CalibrationRebuilt { buckets: usize },
    AgentError { context: String, detail: String },
}

impl AlertType {
    /// Trade/detection events need to reach a channel before the next
    /// cycle step can race past them; everything else can sit in queue.
    pub fn is_immediate(&self) -> bool {
        matches!(
            self,
            AlertType::TradeEntered { .. }
                | AlertType::TradeExited { .. }
                | AlertType::TradeResolved { .. }
                | AlertType::GuaranteedWinDetected { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(alert_type: AlertType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { alert_type, timestamp: Utc::now(), title: title.into(), message: message.into() }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("discord webhook error: {0}")]
    Discord(String),
    #[error("configuration error: {0}")]
    Config(String),
}
