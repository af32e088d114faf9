//! # Live collection
//! The deduplicated, time-bounded list every consumer reads.
//!
//! Each update reads the whole stored list, recomputes it from scratch and
//! replaces it in one write. There are no per-item edits; callers serialize
//! updates (see [`crate::hub::HotNewsHub`]).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use metrics::{counter, gauge};

use crate::dedup::{self, DedupConfig, DedupStats};
use crate::news::NewsItem;
use crate::retention::Retention;
use crate::store::{ListStore, LiveStore, StoreError};

/// An item that entered the collection during this update, with its rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admitted {
    pub rank: usize,
    pub item: NewsItem,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub exact: usize,
    pub near: usize,
    pub evicted: usize,
}

impl From<DedupStats> for MergeStats {
    fn from(d: DedupStats) -> Self {
        Self {
            exact: d.exact,
            near: d.near,
            evicted: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Commit {
    /// Collection as written, newest first.
    pub collection: Vec<NewsItem>,
    /// New items, in collection order.
    pub admitted: Vec<Admitted>,
    pub stats: MergeStats,
}

/// Dedup → retention → newest first. Pure.
pub fn build_collection(
    existing: &[NewsItem],
    incoming: Vec<NewsItem>,
    dedup_cfg: &DedupConfig,
    retention: &Retention,
    now: NaiveDateTime,
) -> (Vec<NewsItem>, MergeStats) {
    let (unique, dstats) = dedup::merge(existing, incoming, dedup_cfg);
    let (mut kept, evicted) = retention.apply(unique, now);
    // stable: equal timestamps keep their relative order across rebuilds
    kept.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let mut stats = MergeStats::from(dstats);
    stats.evicted = evicted;
    (kept, stats)
}

/// Items of `after` whose content did not appear in `before`.
pub fn newly_admitted(before: &[NewsItem], after: &[NewsItem]) -> Vec<Admitted> {
    let known: HashSet<&str> = before.iter().map(|it| it.content.as_str()).collect();
    after
        .iter()
        .enumerate()
        .filter(|(_, it)| !known.contains(it.content.as_str()))
        .map(|(rank, it)| Admitted {
            rank,
            item: it.clone(),
        })
        .collect()
}

pub struct LiveCollection {
    store: Arc<dyn LiveStore>,
    dedup: DedupConfig,
    retention: Retention,
}

impl LiveCollection {
    pub fn new(store: Arc<dyn LiveStore>, dedup: DedupConfig, retention: Retention) -> Self {
        Self {
            store,
            dedup,
            retention,
        }
    }

    pub fn key(&self) -> &str {
        self.store.key()
    }

    pub fn retention(&self) -> &Retention {
        &self.retention
    }

    pub async fn items(&self) -> Result<Vec<NewsItem>, StoreError> {
        self.store.get_all().await
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        self.store.count().await
    }

    /// Merge `batch` into the stored collection and write the result back.
    pub async fn commit(
        &self,
        batch: Vec<NewsItem>,
        now: NaiveDateTime,
    ) -> Result<Commit, StoreError> {
        let existing = self.store.get_all().await?;
        let (collection, stats) =
            build_collection(&existing, batch, &self.dedup, &self.retention, now);
        let admitted = newly_admitted(&existing, &collection);

        self.store.replace_all(&collection).await?;

        counter!("dedup_exact_total").increment(stats.exact as u64);
        counter!("dedup_near_total").increment(stats.near as u64);
        counter!("retention_evicted_total").increment(stats.evicted as u64);
        counter!("live_admitted_total").increment(admitted.len() as u64);
        gauge!("live_items").set(collection.len() as f64);
        tracing::info!(
            target: "store",
            key = self.key(),
            stored = collection.len(),
            admitted = admitted.len(),
            exact = stats.exact,
            near = stats.near,
            evicted = stats.evicted,
            "live collection rewritten"
        );

        Ok(Commit {
            collection,
            admitted,
            stats,
        })
    }

    /// Put `restored` items back next to what is stored now and rebuild.
    /// Returns the rewritten collection.
    pub async fn restore(
        &self,
        current: &[NewsItem],
        restored: Vec<NewsItem>,
        now: NaiveDateTime,
    ) -> Result<Vec<NewsItem>, StoreError> {
        let (collection, stats) =
            build_collection(current, restored, &self.dedup, &self.retention, now);
        self.store.replace_all(&collection).await?;
        gauge!("live_items").set(collection.len() as f64);
        tracing::debug!(
            target: "store",
            key = self.key(),
            stored = collection.len(),
            near = stats.near,
            evicted = stats.evicted,
            "live collection rebuilt"
        );
        Ok(collection)
    }

    /// Retention-only pass over the stored collection. Rewrites only if
    /// something expired; returns how many items were dropped.
    pub async fn clean_expired(&self, now: NaiveDateTime) -> Result<usize, StoreError> {
        let items = self.store.get_all().await?;
        if items.is_empty() {
            return Ok(0);
        }
        let (kept, evicted) = self.retention.apply(items, now);
        if evicted > 0 {
            self.store.replace_all(&kept).await?;
            counter!("retention_evicted_total").increment(evicted as u64);
            gauge!("live_items").set(kept.len() as f64);
            tracing::info!(target: "store", key = self.key(), evicted, remaining = kept.len(), "expired items removed");
        }
        Ok(evicted)
    }
}
