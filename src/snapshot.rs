// src/snapshot.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::news::NewsItem;

pub fn snapshot_file_name(unix_ts: i64) -> String {
    format!("hot_news_{unix_ts}.json")
}

/// Pretty-printed JSON array of `items` under `dir`. Nothing is written for
/// an empty list.
pub async fn write_snapshot(items: &[NewsItem], dir: &Path, unix_ts: i64) -> Result<Option<PathBuf>> {
    if items.is_empty() {
        tracing::info!(target: "store", "live collection empty, no snapshot written");
        return Ok(None);
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating snapshot dir {}", dir.display()))?;

    let body = serde_json::to_string_pretty(items).context("encoding snapshot")?;
    let path = dir.join(snapshot_file_name(unix_ts));
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("writing snapshot {}", path.display()))?;

    tracing::info!(target: "store", path = %path.display(), items = items.len(), "snapshot exported");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::CIVIL_FORMAT;
    use chrono::NaiveDateTime;

    #[tokio::test]
    async fn empty_collection_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = write_snapshot(&[], dir.path(), 1).await.unwrap();
        assert!(out.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn snapshot_keeps_text_readable() {
        let dir = tempfile::tempdir().unwrap();
        let t = NaiveDateTime::parse_from_str("2025-03-14 09:30:00", CIVIL_FORMAT).unwrap();
        let items = vec![NewsItem::new("沪指高开", t).with_tag("-21101")];
        let path = write_snapshot(&items, &dir.path().join("out"), 1_741_915_800)
            .await
            .unwrap()
            .unwrap();
        assert!(path.ends_with("hot_news_1741915800.json"));

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("沪指高开"));
        assert!(body.contains("\"datetime\": \"2025-03-14 09:30:00\""));
        let back: Vec<NewsItem> = serde_json::from_str(&body).unwrap();
        assert_eq!(back, items);
    }
}
