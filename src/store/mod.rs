// src/store/mod.rs
//! Backend seam: named, ordered lists of [`NewsItem`]s.
//!
//! The durable log only ever sees a [`ListStore`], so nothing holding it can
//! delete. The live collection additionally needs [`LiveStore::replace_all`].

mod file;
mod memory;

pub use file::JsonlFile;
pub use memory::MemoryList;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};
use crate::news::NewsItem;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store {key}: i/o error: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("store {key}: corrupt record at line {line}: {source}")]
    Corrupt {
        key: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("store {key}: cannot encode record: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store {key}: backend unavailable: {reason}")]
    Unavailable { key: String, reason: String },
}

#[async_trait::async_trait]
pub trait ListStore: Send + Sync {
    fn key(&self) -> &str;
    /// Whole list, in stored order.
    async fn get_all(&self) -> Result<Vec<NewsItem>, StoreError>;
    async fn count(&self) -> Result<usize, StoreError>;
    /// Bulk append at the tail.
    async fn append(&self, items: &[NewsItem]) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait LiveStore: ListStore {
    /// Delete everything and write `items` in their place, as one step.
    async fn replace_all(&self, items: &[NewsItem]) -> Result<(), StoreError>;
}

/// The two handles a hub needs: the live list and the durable log.
pub struct StorePair {
    pub live: Arc<dyn LiveStore>,
    pub durable: Arc<dyn ListStore>,
}

/// Open the backend described by `cfg`.
pub fn open(cfg: &StoreConfig) -> StorePair {
    match cfg.backend {
        StoreBackend::Memory => StorePair {
            live: Arc::new(MemoryList::new(&cfg.live_key)),
            durable: Arc::new(MemoryList::new(&cfg.backup_key)),
        },
        StoreBackend::File => {
            let dir = PathBuf::from(&cfg.dir);
            StorePair {
                live: Arc::new(JsonlFile::new(&dir, &cfg.live_key)),
                durable: Arc::new(JsonlFile::new(&dir, &cfg.backup_key)),
            }
        }
    }
}
