// src/config/hub.rs
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::dedup::DedupConfig;

fn default_retention_days() -> u32 {
    30
}
fn default_cycle_interval_secs() -> u64 {
    60
}
fn default_cleanup_interval_secs() -> u64 {
    600
}
fn default_error_cooldown_secs() -> u64 {
    60
}
fn default_source_timeout_secs() -> u64 {
    15
}
fn default_utc_offset_minutes() -> i32 {
    // vendors publish in China Standard Time
    480
}
fn default_snapshot_dir() -> String {
    "exports".to_string()
}

/// A century; anything longer is a typo.
pub const MAX_RETENTION_DAYS: u32 = 36_500;

fn offset_of(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    #[serde(default = "default_error_cooldown_secs")]
    pub error_cooldown_secs: u64,
    /// Upper bound for a single source call.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Civil-time zone for item timestamps and retention cutoffs.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            cycle_interval_secs: default_cycle_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            error_cooldown_secs: default_error_cooldown_secs(),
            source_timeout_secs: default_source_timeout_secs(),
            utc_offset_minutes: default_utc_offset_minutes(),
            snapshot_dir: default_snapshot_dir(),
            dedup: DedupConfig::default(),
            store: StoreConfig::default(),
            sources: SourcesConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub dir: String,
    pub live_key: String,
    pub backup_key: String,
    pub channel: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            dir: "data".to_string(),
            live_key: "stock:hot_news".to_string(),
            backup_key: "stock:hot_news_backup".to_string(),
            channel: "stock:hot_news:add".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub enabled: Vec<String>,
    pub rss: Vec<RssFeed>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["cls".into(), "ths".into(), "sina".into()],
            rss: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RssFeed {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Per-request timeout for the webhook.
    pub timeout_secs: u64,
    pub max_retries: u8,
    /// Events waiting for the dispatcher; overflow is dropped and counted.
    pub queue_capacity: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 5,
            max_retries: 3,
            queue_capacity: 1024,
        }
    }
}

impl HubConfig {
    /// Clamp out-of-range values back to something usable.
    pub fn sanitize(mut self) -> Self {
        if self.retention_days == 0 {
            self.retention_days = default_retention_days();
        }
        self.retention_days = self.retention_days.min(MAX_RETENTION_DAYS);
        self.cycle_interval_secs = self.cycle_interval_secs.max(1);
        self.cleanup_interval_secs = self.cleanup_interval_secs.max(1);
        self.error_cooldown_secs = self.error_cooldown_secs.max(1);
        self.source_timeout_secs = self.source_timeout_secs.max(1);
        if offset_of(self.utc_offset_minutes).is_none() {
            self.utc_offset_minutes = default_utc_offset_minutes();
        }
        self.dedup = self.dedup.sanitize();
        self.notify.webhook_url = self
            .notify
            .webhook_url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self.notify.timeout_secs = self.notify.timeout_secs.clamp(1, 300);
        self.notify.max_retries = self.notify.max_retries.clamp(1, 10);
        self.notify.queue_capacity = self.notify.queue_capacity.max(1);
        self
    }

    pub fn utc_offset(&self) -> FixedOffset {
        offset_of(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify.timeout_secs)
    }
}
