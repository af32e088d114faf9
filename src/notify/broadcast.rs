// src/notify/broadcast.rs
use anyhow::Result;
use tokio::sync::broadcast;

use super::Publisher;

/// `(channel, payload)` as delivered to in-process subscribers.
pub type Published = (String, String);

/// In-process pub/sub. Having no subscribers is not an error.
#[derive(Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<Published>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait::async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        if self
            .tx
            .send((channel.to_string(), payload.to_string()))
            .is_err()
        {
            tracing::trace!(target: "notify", channel, "no in-process subscribers");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}
