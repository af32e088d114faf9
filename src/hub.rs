//! # Hub
//! Wires sources, the live collection, the durable log and the notifier into
//! one update cycle:
//!
//! fetch + normalize → commit (dedup, retention, sort, replace) → notify
//! admitted → reconcile live from the log → append admitted to the log.
//!
//! Every store rewrite goes through `cycle_lock`, so an on-demand cycle and
//! the scheduled ones never interleave their read-modify-write.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::backup::DurableLog;
use crate::config::HubConfig;
use crate::ingest::{self, providers, types::FeedSource};
use crate::live::LiveCollection;
use crate::news::{civil_now, NewsItem};
use crate::notify::{
    BroadcastPublisher, ChangeNotifier, Publisher, PublisherMux, WebhookPublisher,
};
use crate::retention::Retention;
use crate::snapshot;
use crate::store::{self, ListStore, LiveStore};

/// What one cycle did.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub normalized: usize,
    pub dropped: usize,
    pub source_errors: usize,
    pub admitted: usize,
    /// Change events handed to the publish queue.
    pub queued: usize,
    pub restored: usize,
    pub backed_up: usize,
    pub live_items: Option<usize>,
    pub durable_items: Option<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct HubStats {
    pub live: usize,
    pub durable: usize,
}

pub struct HotNewsHub {
    sources: Vec<Box<dyn FeedSource>>,
    live: LiveCollection,
    durable: DurableLog,
    notifier: ChangeNotifier,
    source_timeout: Duration,
    offset: FixedOffset,
    snapshot_dir: PathBuf,
    cycle_lock: Mutex<()>,
}

impl HotNewsHub {
    /// Starts the change dispatcher, so this needs a running tokio runtime.
    pub fn new(
        cfg: &HubConfig,
        live: Arc<dyn LiveStore>,
        durable: Arc<dyn ListStore>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            sources: Vec::new(),
            live: LiveCollection::new(live, cfg.dedup, Retention::days(cfg.retention_days)),
            durable: DurableLog::new(durable),
            notifier: ChangeNotifier::spawn(publisher, cfg.store.channel.clone(), cfg.notify.queue_capacity),
            source_timeout: cfg.source_timeout(),
            offset: cfg.utc_offset(),
            snapshot_dir: PathBuf::from(&cfg.snapshot_dir),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn with_source(mut self, source: Box<dyn FeedSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_sources(mut self, sources: Vec<Box<dyn FeedSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Build everything from config: backend, publishers, vendor sources.
    /// Also returns the in-process publisher so callers can subscribe.
    pub fn from_config(cfg: &HubConfig) -> Result<(Self, BroadcastPublisher)> {
        let stores = store::open(&cfg.store);

        let local = BroadcastPublisher::default();
        let mut publishers: Vec<Arc<dyn Publisher>> = vec![Arc::new(local.clone())];
        if let Some(url) = &cfg.notify.webhook_url {
            publishers.push(Arc::new(
                WebhookPublisher::new(url.clone())
                    .with_timeout(cfg.notify.timeout_secs)
                    .with_retries(cfg.notify.max_retries),
            ));
        }
        let publisher = Arc::new(PublisherMux::new(publishers));

        let sources = providers::build_sources(&cfg.sources, cfg.source_timeout())
            .context("building feed sources")?;
        tracing::info!(
            target: "ingest",
            sources = sources.len(),
            live_key = %cfg.store.live_key,
            backup_key = %cfg.store.backup_key,
            "hub configured"
        );

        let hub = Self::new(cfg, stores.live, stores.durable, publisher).with_sources(sources);
        Ok((hub, local))
    }

    /// Current civil time in the configured zone.
    pub fn now(&self) -> NaiveDateTime {
        civil_now(self.offset)
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// One full cycle. Only a live-store failure during the commit is
    /// returned as an error; everything else is logged and counted.
    pub async fn run_cycle(&self, now: NaiveDateTime) -> Result<CycleReport> {
        let _guard = self.cycle_lock.lock().await;
        counter!("cycle_runs_total").increment(1);

        let batch = ingest::ingest_once(&self.sources, self.source_timeout, self.offset).await;
        let mut report = CycleReport {
            fetched: batch.fetched,
            normalized: batch.items.len(),
            dropped: batch.dropped,
            source_errors: batch.source_errors,
            ..CycleReport::default()
        };

        let mut admitted: Vec<NewsItem> = Vec::new();
        if !batch.items.is_empty() {
            let commit = self
                .live
                .commit(batch.items, now)
                .await
                .context("committing live collection")?;
            report.admitted = commit.admitted.len();

            report.queued = self.notifier.announce(&commit.admitted, Utc::now()).queued;

            admitted = commit.admitted.into_iter().map(|a| a.item).collect();
        }

        // reconcile first so the append below never races a restore
        match self.durable.reconcile(&self.live, now).await {
            Ok(r) => report.restored = r.restored(),
            Err(e) => tracing::warn!(target: "backup", "reconcile failed: {e:#}"),
        }

        if !admitted.is_empty() {
            match self.durable.append_admitted(&admitted).await {
                Ok(n) => report.backed_up = n,
                Err(e) => tracing::warn!(target: "backup", "backup append failed: {e:#}"),
            }
        }

        report.live_items = self.live.count().await.ok();
        report.durable_items = self.durable.count().await.ok();
        gauge!("cycle_last_run_ts").set(Utc::now().timestamp() as f64);

        tracing::info!(
            target: "ingest",
            fetched = report.fetched,
            dropped = report.dropped,
            source_errors = report.source_errors,
            admitted = report.admitted,
            restored = report.restored,
            backed_up = report.backed_up,
            "cycle finished"
        );
        Ok(report)
    }

    /// Retention-only pass; returns the number of evicted items.
    pub async fn clean_expired(&self, now: NaiveDateTime) -> Result<usize> {
        let _guard = self.cycle_lock.lock().await;
        self.live
            .clean_expired(now)
            .await
            .context("cleaning expired items")
    }

    pub async fn stats(&self) -> Result<HubStats> {
        Ok(HubStats {
            live: self.live.count().await.context("counting live")?,
            durable: self.durable.count().await.context("counting durable log")?,
        })
    }

    /// Newest `limit` items of the live collection.
    pub async fn latest(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let mut items = self.live.items().await.context("reading live")?;
        items.truncate(limit);
        Ok(items)
    }

    /// Write the live collection to a timestamped file under the snapshot
    /// dir. `None` when there is nothing to export.
    pub async fn export_snapshot(&self) -> Result<Option<PathBuf>> {
        let items = self.live.items().await.context("reading live")?;
        snapshot::write_snapshot(&items, &self.snapshot_dir, Utc::now().timestamp()).await
    }
}
