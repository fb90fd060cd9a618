use crate::{Alert, NotificationChannel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Dispatches alerts to every configured channel. Immediate events
/// (trade lifecycle, guaranteed-win detection) are awaited inline so the
/// caller can't race past a failed send; everything else is pushed onto
/// an internal queue drained by a background task paced at one alert per
/// tick, so a burst of scan-summary/calibration alerts can't hammer the
/// webhook.
pub struct AlertQueue {
    channels: Arc<Vec<Box<dyn NotificationChannel>>>,
    tx: mpsc::UnboundedSender<Alert>,
    drain_handle: JoinHandle<()>,
}

impl AlertQueue {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>, drain_interval: Duration) -> Self {
        let channels = Arc::new(channels);
        let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();

        let drain_channels = channels.clone();
        let drain_handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(drain_interval);
            loop {
                tick.tick().await;
                match rx.recv().await {
                    Some(alert) => dispatch(&drain_channels, &alert).await,
                    None => break,
                }
            }
        });

        Self { channels, tx, drain_handle }
    }

    /// Route one alert: awaited immediately if its type demands it,
    /// queued otherwise.
    pub async fn send(&self, alert: Alert) {
        if alert.alert_type.is_immediate() {
            dispatch(&self.channels, &alert).await;
        } else if self.tx.send(alert).is_err() {
            tracing::warn!("alert queue closed, dropping queued alert");
        }
    }

    /// Stop accepting new queued alerts and drain whatever is left before
    /// returning, so a shutdown never silently discards a pending alert.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.drain_handle.await;
    }
}

async fn dispatch(channels: &[Box<dyn NotificationChannel>], alert: &Alert) {
    for channel in channels {
        if let Err(e) = channel.send(alert).await {
            tracing::warn!("failed to send notification via {}: {}", channel.name(), e);
        }
    }
}
