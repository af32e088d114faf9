// src/ingest/types.rs
use anyhow::Result;
use serde::Deserialize;

/// Publish time exactly as a vendor reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceTime {
    /// Unix seconds.
    Unix(i64),
    /// Civil `YYYY-MM-DD HH:MM:SS`, RFC 3339, RFC 2822 or digits-only unix seconds.
    Text(String),
}

/// Vendor record mapped into a common shape, not yet normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub source: String,
    pub content: String,
    pub published: SourceTime,
    pub tag: Option<String>,
}

impl RawItem {
    pub fn new(source: impl Into<String>, content: impl Into<String>, published: SourceTime) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            published,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }
}

/// A vendor feed. `Err` means the call failed; `Ok(vec![])` means nothing new.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>>;
    fn name(&self) -> &str;
}
