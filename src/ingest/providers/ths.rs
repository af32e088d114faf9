// src/ingest/providers/ths.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::Mode;
use crate::ingest::types::{FeedSource, RawItem, SourceTime};

const URL: &str = "https://news.10jqka.com.cn/tapp/news/push/stock/";
const NAME: &str = "ths";

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    list: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    digest: String,
    ctime: SourceTime,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    id: serde_json::Value,
}

/// 10jqka realtime stock news.
pub struct ThsProvider {
    mode: Mode,
}

impl ThsProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: URL.to_string(),
                referer: "https://news.10jqka.com.cn/realtimenews.html",
                query: vec![
                    ("page", "1".to_string()),
                    ("track", "website".to_string()),
                    ("pagesize", "400".to_string()),
                ],
                client,
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let env: Envelope = serde_json::from_str(s).context("parsing ths news json")?;
        Ok(env
            .data
            .list
            .into_iter()
            .map(|it| {
                // ids arrive either as strings or numbers
                let tag = it.tags.first().map(|t| match &t.id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                RawItem::new(NAME, it.digest, it.ctime).with_tag(tag)
            })
            .collect())
    }
}

#[async_trait]
impl FeedSource for ThsProvider {
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
    fn string_ctime_and_first_tag() {
        let json = r#"{"data": {"list": [
            {"digest": "摘要", "ctime": "1741833391", "tags": [{"id": "-21101"}, {"id": "x"}]},
            {"digest": "无标签", "ctime": "1741833300", "tags": []},
            {"digest": "数字标签", "ctime": "1741833200", "tags": [{"id": 7}]}
        ]}}"#;
        let items = ThsProvider::parse_items_from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].published, SourceTime::Text("1741833391".into()));
        assert_eq!(items[0].tag.as_deref(), Some("-21101"));
        assert_eq!(items[1].tag, None);
        assert_eq!(items[2].tag.as_deref(), Some("7"));
    }
}
