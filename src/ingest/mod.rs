// src/ingest/mod.rs
pub mod normalize;
pub mod providers;
pub mod types;

use std::time::{Duration, Instant};

use chrono::FixedOffset;
use metrics::{counter, histogram};

use crate::ingest::types::{FeedSource, RawItem};
use crate::news::NewsItem;

pub use normalize::{normalize_batch, normalize_text};

/// One cycle's worth of source output, already normalized.
#[derive(Debug, Default)]
pub struct IngestBatch {
    pub items: Vec<NewsItem>,
    pub fetched: usize,
    pub dropped: usize,
    pub source_errors: usize,
}

/// Call every source concurrently, each bounded by `timeout`.
/// A failing or hanging source contributes zero items and is counted.
pub async fn fetch_all(sources: &[Box<dyn FeedSource>], timeout: Duration) -> (Vec<RawItem>, usize) {
    let calls = sources.iter().map(|s| async move {
        let t0 = Instant::now();
        let res = tokio::time::timeout(timeout, s.fetch_latest()).await;
        (s.name(), res, t0.elapsed())
    });
    let results = futures::future::join_all(calls).await;

    let mut raw = Vec::new();
    let mut errors = 0usize;
    for (name, res, elapsed) in results {
        histogram!("ingest_fetch_ms").record(elapsed.as_secs_f64() * 1_000.0);
        match res {
            Ok(Ok(mut items)) => {
                tracing::info!(target: "ingest", provider = name, count = items.len(), "provider fetched");
                counter!("ingest_events_total").increment(items.len() as u64);
                raw.append(&mut items);
            }
            Ok(Err(e)) => {
                errors += 1;
                tracing::warn!(target: "ingest", provider = name, error = ?e, "provider error");
                counter!("ingest_source_errors_total").increment(1);
            }
            Err(_) => {
                errors += 1;
                tracing::warn!(
                    target: "ingest",
                    provider = name,
                    timeout_ms = timeout.as_millis() as u64,
                    "provider timed out"
                );
                counter!("ingest_source_errors_total").increment(1);
            }
        }
    }
    (raw, errors)
}

/// Fetch from all sources and normalize the combined output.
pub async fn ingest_once(
    sources: &[Box<dyn FeedSource>],
    timeout: Duration,
    offset: FixedOffset,
) -> IngestBatch {
    let (raw, source_errors) = fetch_all(sources, timeout).await;
    let fetched = raw.len();
    let (items, dropped) = normalize_batch(raw, offset);
    IngestBatch {
        items,
        fetched,
        dropped,
        source_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceTime;
    use anyhow::{anyhow, Result};

    struct Fixed(&'static str, Vec<RawItem>);

    #[async_trait::async_trait]
    impl FeedSource for Fixed {
        async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
            Ok(self.1.clone())
        }
        fn name(&self) -> &str {
            self.0
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl FeedSource for Broken {
        async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
            Err(anyhow!("503"))
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let sources: Vec<Box<dyn FeedSource>> = vec![
            Box::new(Fixed(
                "a",
                vec![RawItem::new("a", "one", SourceTime::Text("2025-03-14 09:30:00".into()))],
            )),
            Box::new(Broken),
            Box::new(Fixed(
                "b",
                vec![RawItem::new("b", "two", SourceTime::Text("nope".into()))],
            )),
        ];
        let batch = ingest_once(
            &sources,
            Duration::from_secs(1),
            FixedOffset::east_opt(0).unwrap(),
        )
        .await;
        assert_eq!(batch.fetched, 2);
        assert_eq!(batch.source_errors, 1);
        assert_eq!(batch.dropped, 1);
        assert_eq!(batch.items.len(), 1);
    }

    #[tokio::test]
    async fn no_sources_is_an_empty_batch() {
        let batch = ingest_once(&[], Duration::from_secs(1), FixedOffset::east_opt(0).unwrap()).await;
        assert!(batch.items.is_empty());
        assert_eq!(batch.source_errors, 0);
    }
}
