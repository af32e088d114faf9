//! # Deduplicator
//! Merges the existing collection with a fresh batch and removes exact and
//! near-duplicate items. Output is ascending by publish time.
//!
//! Exact duplicates share a content fingerprint. Near duplicates are caught
//! with a cheap character-set overlap over the first few characters, only
//! against a short trailing window of accepted items: wire copy gets
//! re-published with small edits within minutes, not days.

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::news::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// How many accepted items the near-duplicate scan looks back over.
    pub window_items: usize,
    /// Scan stops at the first accepted item older than this.
    pub window_minutes: i64,
    /// Overlap ratio that must be exceeded to call two items the same.
    pub similarity_threshold: f64,
    /// Pairs whose lengths differ by more than this share of the current
    /// item's length are never compared.
    pub length_tolerance: f64,
    /// Leading characters that make up an item's feature set.
    pub feature_chars: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_items: 20,
            window_minutes: 10,
            similarity_threshold: 0.7,
            length_tolerance: 0.3,
            feature_chars: 50,
        }
    }
}

/// One day; near-duplicates are re-publications minutes apart.
pub const MAX_WINDOW_MINUTES: i64 = 1_440;

impl DedupConfig {
    pub fn sanitize(mut self) -> Self {
        let d = Self::default();
        self.window_items = self.window_items.max(1);
        if self.window_minutes < 0 {
            self.window_minutes = d.window_minutes;
        }
        self.window_minutes = self.window_minutes.min(MAX_WINDOW_MINUTES);
        if !self.similarity_threshold.is_finite() {
            self.similarity_threshold = d.similarity_threshold;
        }
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
        if !self.length_tolerance.is_finite() || self.length_tolerance < 0.0 {
            self.length_tolerance = d.length_tolerance;
        }
        self.feature_chars = self.feature_chars.max(1);
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub exact: usize,
    pub near: usize,
}

/// An accepted item as the near-duplicate scan sees it.
struct Accepted {
    published_at: NaiveDateTime,
    len: usize,
    features: HashSet<char>,
}

fn feature_set(content: &str, n: usize) -> HashSet<char> {
    content.chars().take(n).collect()
}

fn is_near_duplicate(
    window: &VecDeque<Accepted>,
    published_at: NaiveDateTime,
    len: usize,
    features: &HashSet<char>,
    cfg: &DedupConfig,
) -> bool {
    // unrepresentable gap: every prior item is in range
    let max_gap = chrono::TimeDelta::try_minutes(cfg.window_minutes).unwrap_or(chrono::TimeDelta::MAX);
    let len_slack = len as f64 * cfg.length_tolerance;
    let needed = features.len() as f64 * cfg.similarity_threshold;

    for prior in window.iter().rev() {
        // window is time-ordered, nothing further back can be closer
        if published_at - prior.published_at > max_gap {
            break;
        }
        if (len as f64 - prior.len as f64).abs() > len_slack {
            continue;
        }
        let shared = features.intersection(&prior.features).count();
        if shared as f64 > needed {
            return true;
        }
    }
    false
}

/// Deduplicate `items`. The earliest copy of each story wins.
///
/// Ties in publish time keep their input order, so the result is
/// deterministic for a given input sequence.
pub fn deduplicate(mut items: Vec<NewsItem>, cfg: &DedupConfig) -> (Vec<NewsItem>, DedupStats) {
    items.sort_by_key(|it| it.published_at);

    let mut stats = DedupStats::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut window: VecDeque<Accepted> = VecDeque::with_capacity(cfg.window_items);
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let fp = item.fingerprint();
        if seen.contains(&fp) {
            stats.exact += 1;
            continue;
        }

        let features = feature_set(&item.content, cfg.feature_chars);
        let len = item.content.chars().count();
        if is_near_duplicate(&window, item.published_at, len, &features, cfg) {
            stats.near += 1;
            continue;
        }

        seen.insert(fp);
        if window.len() >= cfg.window_items {
            window.pop_front();
        }
        window.push_back(Accepted {
            published_at: item.published_at,
            len,
            features,
        });
        out.push(item);
    }

    if stats.exact + stats.near > 0 {
        tracing::debug!(
            target: "ingest",
            exact = stats.exact,
            near = stats.near,
            kept = out.len(),
            "dedup pass"
        );
    }
    (out, stats)
}

/// `existing ++ incoming`, deduplicated.
pub fn merge(
    existing: &[NewsItem],
    incoming: Vec<NewsItem>,
    cfg: &DedupConfig,
) -> (Vec<NewsItem>, DedupStats) {
    let mut all = Vec::with_capacity(existing.len() + incoming.len());
    all.extend_from_slice(existing);
    all.extend(incoming);
    deduplicate(all, cfg)
}
