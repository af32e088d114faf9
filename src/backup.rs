//! # Durable log
//! Append-only superset of everything ever admitted to the live collection.
//! Never evicted; only read back to repair the live copy.
//!
//! Membership is raw content equality, deliberately coarser than the
//! fingerprint check the live collection uses.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use metrics::{counter, gauge};

use crate::live::LiveCollection;
use crate::news::NewsItem;
use crate::store::{ListStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Live holds at least as many items as the log; nothing checked.
    InSync { live: usize, durable: usize },
    /// Live was smaller, but every logged item is present already.
    NothingMissing { live: usize, durable: usize },
    /// `missing` logged items were merged back, `restored` of them survived
    /// dedup and retention; live now holds `live_after`.
    Restored {
        missing: usize,
        restored: usize,
        live_after: usize,
    },
}

impl Reconciliation {
    pub fn restored(&self) -> usize {
        match self {
            Reconciliation::Restored { restored, .. } => *restored,
            _ => 0,
        }
    }
}

pub struct DurableLog {
    store: Arc<dyn ListStore>,
}

impl DurableLog {
    pub fn new(store: Arc<dyn ListStore>) -> Self {
        Self { store }
    }

    pub fn key(&self) -> &str {
        self.store.key()
    }

    pub async fn items(&self) -> Result<Vec<NewsItem>, StoreError> {
        self.store.get_all().await
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        self.store.count().await
    }

    /// Append the admitted items whose content is not logged yet.
    /// Returns how many were appended.
    pub async fn append_admitted(&self, admitted: &[NewsItem]) -> Result<usize, StoreError> {
        if admitted.is_empty() {
            return Ok(0);
        }
        let logged = self.store.get_all().await?;
        let mut known: HashSet<&str> = logged.iter().map(|it| it.content.as_str()).collect();

        let delta: Vec<NewsItem> = admitted
            .iter()
            .filter(|it| known.insert(it.content.as_str()))
            .cloned()
            .collect();
        if delta.is_empty() {
            tracing::debug!(target: "backup", key = self.key(), "nothing new to back up");
            return Ok(0);
        }

        self.store.append(&delta).await?;
        counter!("backup_appended_total").increment(delta.len() as u64);
        gauge!("durable_items").set((logged.len() + delta.len()) as f64);
        tracing::info!(
            target: "backup",
            key = self.key(),
            appended = delta.len(),
            total = logged.len() + delta.len(),
            "admitted items backed up"
        );
        Ok(delta.len())
    }

    /// If live is smaller than the log, merge back whatever the log has that
    /// live lacks, then rebuild live through dedup and retention.
    pub async fn reconcile(
        &self,
        live: &LiveCollection,
        now: NaiveDateTime,
    ) -> Result<Reconciliation, StoreError> {
        let live_count = live.count().await?;
        let durable_count = self.store.count().await?;
        gauge!("durable_items").set(durable_count as f64);
        if live_count >= durable_count {
            return Ok(Reconciliation::InSync {
                live: live_count,
                durable: durable_count,
            });
        }

        tracing::warn!(
            target: "backup",
            live = live_count,
            durable = durable_count,
            "live collection smaller than durable log, checking for lost items"
        );

        let current = live.items().await?;
        let logged = self.store.get_all().await?;
        let present: HashSet<&str> = current.iter().map(|it| it.content.as_str()).collect();
        let missing: Vec<NewsItem> = logged
            .iter()
            .filter(|it| !present.contains(it.content.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() {
            tracing::info!(target: "backup", "no logged items missing from live");
            return Ok(Reconciliation::NothingMissing {
                live: live_count,
                durable: durable_count,
            });
        }

        let n_missing = missing.len();
        let wanted: HashSet<String> = missing.iter().map(|it| it.content.clone()).collect();
        let rebuilt = live.restore(&current, missing, now).await?;
        // the same rebuild may also evict current items, so count by content
        let back = rebuilt
            .iter()
            .filter(|it| wanted.contains(&it.content))
            .count();
        counter!("backup_restored_total").increment(back as u64);
        tracing::info!(
            target: "backup",
            missing = n_missing,
            restored = back,
            live_after = rebuilt.len(),
            "live collection reconciled from durable log"
        );
        Ok(Reconciliation::Restored {
            missing: n_missing,
            restored: back,
            live_after: rebuilt.len(),
        })
    }
}
