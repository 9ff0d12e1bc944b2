//! NATS-backed notification sink with a channel-based architecture:
//! `deliver` enqueues without blocking, a background task publishes.
//! The broker is a side channel — a full queue or a publish failure is
//! counted and logged, never surfaced to the caller.

use rotation_core::config::NatsConfig;
use rotation_core::notify::NotificationSink;
use rotation_core::types::Notification;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Publishes engagement notifications to a NATS subject.
pub struct NatsNotifier {
    sender: mpsc::Sender<Notification>,
}

impl NatsNotifier {
    /// Connect to NATS and spawn the background publisher.
    pub async fn connect(config: &NatsConfig) -> anyhow::Result<Self> {
        let url = config
            .urls
            .first()
            .cloned()
            .unwrap_or_else(|| "nats://localhost:4222".to_string());

        info!(url = %url, "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .max_reconnects(Some(config.max_reconnects))
            .connect(&url)
            .await?;

        info!(subject = %config.subject, "NATS connection established");

        let (sender, receiver) = mpsc::channel::<Notification>(config.queue_capacity);
        tokio::spawn(publish_loop(client, config.subject.clone(), receiver));

        Ok(Self { sender })
    }
}

impl NotificationSink for NatsNotifier {
    fn deliver(&self, notification: Notification) {
        if let Err(e) = self.sender.try_send(notification) {
            metrics::counter!("notify.dropped").increment(1);
            warn!("Engagement notification dropped: {}", e);
        } else {
            metrics::counter!("notify.queued").increment(1);
        }
    }
}

async fn publish_loop(
    client: async_nats::Client,
    subject: String,
    mut receiver: mpsc::Receiver<Notification>,
) {
    while let Some(notification) = receiver.recv().await {
        let payload = match serde_json::to_vec(&notification) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize notification");
                continue;
            }
        };

        match client.publish(subject.clone(), payload.into()).await {
            Ok(_) => {
                metrics::counter!("notify.published").increment(1);
            }
            Err(e) => {
                metrics::counter!("notify.failed").increment(1);
                warn!(error = %e, type_event = %notification.type_event, "Failed to publish notification");
            }
        }
    }
}
