// src/notify/mod.rs
//! Change notification: one event per newly admitted item.

pub mod broadcast;
pub mod webhook;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::live::Admitted;
use crate::news::short;

pub use broadcast::BroadcastPublisher;
pub use webhook::WebhookPublisher;

/// Wire payload read by downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Digest of `content|datetime`.
    #[serde(rename = "hash")]
    pub fingerprint: String,
    /// Rank of the item in the live collection at commit time.
    #[serde(rename = "index")]
    pub position: usize,
    /// Unix seconds.
    #[serde(rename = "timestamp")]
    pub emitted_at: f64,
}

impl ChangeEvent {
    pub fn for_admitted(a: &Admitted, emitted_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: a.item.event_fingerprint(),
            position: a.rank,
            emitted_at: emitted_at.timestamp_millis() as f64 / 1_000.0,
        }
    }
}

/// Fire-and-forget topic.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Fan-out to several publishers. Fails if any of them failed, after
/// every one has been tried.
pub struct PublisherMux {
    publishers: Vec<Arc<dyn Publisher>>,
}

impl PublisherMux {
    pub fn new(publishers: Vec<Arc<dyn Publisher>>) -> Self {
        Self { publishers }
    }
}

#[async_trait::async_trait]
impl Publisher for PublisherMux {
    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut failed = Vec::new();
        for p in &self.publishers {
            if let Err(e) = p.publish(channel, payload).await {
                tracing::warn!(target: "notify", publisher = p.name(), "publish failed: {e:#}");
                failed.push(p.name());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("publish failed on {}", failed.join(", ")))
        }
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyReport {
    pub queued: usize,
    pub dropped: usize,
}

/// Queues change events for a background dispatcher, so a slow or failing
/// publisher never holds up the cycle. Events go out in queue order.
pub struct ChangeNotifier {
    tx: mpsc::Sender<ChangeEvent>,
    dispatcher: JoinHandle<()>,
}

impl ChangeNotifier {
    /// Starts the dispatcher task; must be called inside a tokio runtime.
    pub fn spawn(publisher: Arc<dyn Publisher>, channel: impl Into<String>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dispatcher = tokio::spawn(dispatch(publisher, channel.into(), rx));
        Self { tx, dispatcher }
    }

    /// Queue one event per admitted item, in order. Never waits: with the
    /// queue full the event is dropped and counted as an error.
    pub fn announce(&self, admitted: &[Admitted], now: DateTime<Utc>) -> NotifyReport {
        let mut report = NotifyReport::default();
        for a in admitted {
            let ev = ChangeEvent::for_admitted(a, now);
            match self.tx.try_send(ev) {
                Ok(()) => report.queued += 1,
                Err(e) => {
                    report.dropped += 1;
                    let reason = match &e {
                        TrySendError::Full(_) => "queue full",
                        TrySendError::Closed(_) => "dispatcher stopped",
                    };
                    let ev = e.into_inner();
                    tracing::warn!(target: "notify", hash = short(&ev.fingerprint), reason, "change event dropped");
                }
            }
        }
        counter!("notify_errors_total").increment(report.dropped as u64);
        report
    }

    /// Stop accepting events and wait until the queued ones are out.
    pub async fn drain(self) {
        drop(self.tx);
        if let Err(e) = self.dispatcher.await {
            tracing::warn!(target: "notify", "change dispatcher ended abnormally: {e}");
        }
    }
}

async fn dispatch(publisher: Arc<dyn Publisher>, channel: String, mut rx: mpsc::Receiver<ChangeEvent>) {
    while let Some(ev) = rx.recv().await {
        publish_event(publisher.as_ref(), &channel, &ev).await;
    }
    tracing::debug!(target: "notify", channel = %channel, "change dispatcher stopped");
}

/// A failed publish is logged and counted; the next event still goes out.
async fn publish_event(publisher: &dyn Publisher, channel: &str, ev: &ChangeEvent) -> bool {
    let payload = match serde_json::to_string(ev) {
        Ok(p) => p,
        Err(e) => {
            counter!("notify_errors_total").increment(1);
            tracing::warn!(target: "notify", "encode change event: {e:#}");
            return false;
        }
    };
    match publisher.publish(channel, &payload).await {
        Ok(()) => {
            counter!("notify_published_total").increment(1);
            tracing::debug!(target: "notify", hash = short(&ev.fingerprint), index = ev.position, "change event published");
            true
        }
        Err(e) => {
            counter!("notify_errors_total").increment(1);
            tracing::warn!(target: "notify", hash = short(&ev.fingerprint), "change event not published: {e:#}");
            false
        }
    }
}
