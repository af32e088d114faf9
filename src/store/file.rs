// src/store/file.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use metrics::counter;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{ListStore, LiveStore, StoreError};
use crate::news::NewsItem;

/// One JSON object per line, UTF-8. A missing file is an empty list.
///
/// `replace_all` writes a sibling temp file and renames it over the original,
/// so readers see either the old list or the new one.
#[derive(Debug)]
pub struct JsonlFile {
    key: String,
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// `stock:hot_news` → `stock_hot_news.jsonl`
fn file_name_for(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{stem}.jsonl")
}

/// Every write ends in `\n`, so a last line without one is an append that
/// was cut short. Returns the complete part and that tail, if any.
fn split_torn_tail(body: &str) -> (&str, Option<&str>) {
    if body.is_empty() || body.ends_with('\n') {
        return (body, None);
    }
    let cut = body.rfind('\n').map_or(0, |i| i + 1);
    (&body[..cut], Some(&body[cut..]))
}

impl JsonlFile {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            key: key.to_string(),
            path: dir.join(file_name_for(key)),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: self.key.clone(),
            source,
        }
    }

    async fn read_body(&self) -> Result<String, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.io(e)),
        }
    }

    fn encode(&self, items: &[NewsItem]) -> Result<String, StoreError> {
        let mut out = String::new();
        for it in items {
            let line = serde_json::to_string(it).map_err(|source| StoreError::Encode {
                key: self.key.clone(),
                source,
            })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Decoded tail record, or `None` (logged) when it is a torn write.
    fn decode_tail(&self, tail: &str) -> Option<NewsItem> {
        if tail.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(tail) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(target: "store", key = %self.key, bytes = tail.len(), "skipping incomplete last record: {e}");
                None
            }
        }
    }

    fn decode(&self, body: &str) -> Result<Vec<NewsItem>, StoreError> {
        let (complete, tail) = split_torn_tail(body);
        let mut out = Vec::new();
        for (idx, line) in complete.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let item = serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                key: self.key.clone(),
                line: idx + 1,
                source,
            })?;
            out.push(item);
        }
        out.extend(tail.and_then(|t| self.decode_tail(t)));
        Ok(out)
    }

    /// Before appending: cut a torn tail off the file, or terminate a
    /// complete one, so the new records start on a fresh line.
    async fn repair_tail(&self) -> Result<&'static str, StoreError> {
        let body = self.read_body().await?;
        let (complete, tail) = split_torn_tail(&body);
        let Some(tail) = tail else {
            return Ok("");
        };
        if serde_json::from_str::<NewsItem>(tail).is_ok() {
            return Ok("\n");
        }
        let f = fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io(e))?;
        f.set_len(complete.len() as u64).await.map_err(|e| self.io(e))?;
        counter!("store_torn_records_total").increment(1);
        tracing::warn!(target: "store", key = %self.key, bytes = tail.len(), "cut incomplete last record before append");
        Ok("")
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| self.io(e))?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ListStore for JsonlFile {
    fn key(&self) -> &str {
        &self.key
    }

    async fn get_all(&self) -> Result<Vec<NewsItem>, StoreError> {
        let body = self.read_body().await?;
        self.decode(&body)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let body = self.read_body().await?;
        let (complete, tail) = split_torn_tail(&body);
        let full = complete.lines().filter(|l| !l.trim().is_empty()).count();
        let partial = tail.and_then(|t| self.decode_tail(t)).map_or(0, |_| 1);
        Ok(full + partial)
    }

    async fn append(&self, items: &[NewsItem]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }
        let payload = self.encode(items)?;
        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;
        let lead = self.repair_tail().await?;
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io(e))?;
        f.write_all(format!("{lead}{payload}").as_bytes()).await.map_err(|e| self.io(e))?;
        f.flush().await.map_err(|e| self.io(e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LiveStore for JsonlFile {
    async fn replace_all(&self, items: &[NewsItem]) -> Result<(), StoreError> {
        let payload = self.encode(items)?;
        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;
        let tmp = self.path.with_extension("jsonl.tmp");
        fs::write(&tmp, payload.as_bytes()).await.map_err(|e| self.io(e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| self.io(e))?;
        Ok(())
    }
}
