// src/ingest/providers/sina.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::Mode;
use crate::ingest::types::{FeedSource, RawItem, SourceTime};

const URL: &str = "https://zhibo.sina.com.cn/api/zhibo/feed";
const NAME: &str = "sina";

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Wrapper,
}
#[derive(Debug, Deserialize)]
struct Wrapper {
    data: Data,
}
#[derive(Debug, Deserialize)]
struct Data {
    feed: Feed,
}
#[derive(Debug, Deserialize)]
struct Feed {
    list: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    rich_text: String,
    create_time: String,
}

/// Sina Finance live feed (zhibo 152). Times already come as civil time.
pub struct SinaProvider {
    mode: Mode,
}

impl SinaProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: URL.to_string(),
                referer: "https://finance.sina.com.cn/stock/",
                query: vec![
                    ("zhibo_id", "152".to_string()),
                    ("tag_id", "0".to_string()),
                    ("page", "1".to_string()),
                    ("page_size", "20".to_string()),
                    ("type", "0".to_string()),
                ],
                client,
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let env: Envelope = serde_json::from_str(s).context("parsing sina zhibo json")?;
        Ok(env
            .result
            .data
            .feed
            .list
            .into_iter()
            .map(|it| RawItem::new(NAME, it.rich_text, SourceTime::Text(it.create_time)))
            .collect())
    }
}

#[async_trait]
impl FeedSource for SinaProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self.mode.body(NAME).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_create_time_is_passed_through() {
        let json = r#"{"result": {"status": {"code": 0}, "data": {"feed": {"list": [
            {"id": 1, "rich_text": "【快讯】沪指午后翻红", "create_time": "2025-03-14 13:05:12"}
        ]}}}}"#;
        let items = SinaProvider::parse_items_from_str(json).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "sina");
        assert_eq!(items[0].published, SourceTime::Text("2025-03-14 13:05:12".into()));
        assert!(items[0].tag.is_none());
    }

    #[test]
    fn missing_feed_is_an_error() {
        assert!(SinaProvider::parse_items_from_str(r#"{"result": {"data": {}}}"#).is_err());
    }
}
