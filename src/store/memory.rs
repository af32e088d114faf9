// src/store/memory.rs
use tokio::sync::RwLock;

use super::{ListStore, LiveStore, StoreError};
use crate::news::NewsItem;

/// In-process list. Used for `backend = "memory"` and in tests.
#[derive(Debug)]
pub struct MemoryList {
    key: String,
    items: RwLock<Vec<NewsItem>>,
}

impl MemoryList {
    pub fn new(key: &str) -> Self {
        Self::with_items(key, Vec::new())
    }

    pub fn with_items(key: &str, items: Vec<NewsItem>) -> Self {
        Self {
            key: key.to_string(),
            items: RwLock::new(items),
        }
    }
}

#[async_trait::async_trait]
impl ListStore for MemoryList {
    fn key(&self) -> &str {
        &self.key
    }

    async fn get_all(&self) -> Result<Vec<NewsItem>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.items.read().await.len())
    }

    async fn append(&self, items: &[NewsItem]) -> Result<(), StoreError> {
        self.items.write().await.extend_from_slice(items);
        Ok(())
    }
}

#[async_trait::async_trait]
impl LiveStore for MemoryList {
    async fn replace_all(&self, items: &[NewsItem]) -> Result<(), StoreError> {
        let mut guard = self.items.write().await;
        guard.clear();
        guard.extend_from_slice(items);
        Ok(())
    }
}
