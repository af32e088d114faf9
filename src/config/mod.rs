// src/config/mod.rs
mod hub;

pub use hub::{
    HubConfig, NotifyConfig, RssFeed, SourcesConfig, StoreBackend, StoreConfig, MAX_RETENTION_DAYS,
};

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "HOT_NEWS_CONFIG";
pub const ENV_RETENTION_DAYS: &str = "HOT_NEWS_RETENTION_DAYS";
pub const ENV_CYCLE_INTERVAL_SECS: &str = "HOT_NEWS_CYCLE_INTERVAL_SECS";
pub const ENV_STORE_DIR: &str = "HOT_NEWS_STORE_DIR";
pub const ENV_WEBHOOK_URL: &str = "HOT_NEWS_WEBHOOK_URL";

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<HubConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(apply_env_overrides(cfg).sanitize())
}

/// Load config using env var + fallbacks:
/// 1) $HOT_NEWS_CONFIG
/// 2) config/hot_news.toml
/// 3) config/hot_news.json
/// 4) built-in defaults
pub fn load_default() -> Result<HubConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/hot_news.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/hot_news.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(apply_env_overrides(HubConfig::default()).sanitize())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<HubConfig> {
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return serde_json::from_str(s).context("invalid json config");
    }
    toml::from_str(s).context("invalid toml config")
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

fn apply_env_overrides(mut cfg: HubConfig) -> HubConfig {
    if let Some(days) = env_parsed::<u32>(ENV_RETENTION_DAYS) {
        cfg.retention_days = days;
    }
    if let Some(secs) = env_parsed::<u64>(ENV_CYCLE_INTERVAL_SECS) {
        cfg.cycle_interval_secs = secs;
    }
    if let Ok(dir) = std::env::var(ENV_STORE_DIR) {
        if !dir.trim().is_empty() {
            cfg.store.dir = dir.trim().to_string();
        }
    }
    if let Ok(url) = std::env::var(ENV_WEBHOOK_URL) {
        cfg.notify.webhook_url = Some(url);
    }
    cfg
}
