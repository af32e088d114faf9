// src/ingest/providers/cls.rs
//! Cailian Press telegraph feed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::Mode;
use crate::ingest::types::{FeedSource, RawItem, SourceTime};

const URL: &str = "https://www.cls.cn/nodeapi/updateTelegraphList";
const NAME: &str = "cls";

/// Vendor color codes for "level" A / B headlines.
const TAG_LEVEL_A: &str = "-21101";
const TAG_LEVEL_B: &str = "21111";

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Data,
    #[serde(rename = "vipGlobal", default)]
    vip_global: Vec<VipItem>,
}

#[derive(Debug, Deserialize)]
struct Data {
    roll_data: Vec<RollItem>,
}

#[derive(Debug, Deserialize)]
struct RollItem {
    content: String,
    ctime: SourceTime,
    #[serde(default)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VipItem {
    brief: String,
    ctime: SourceTime,
}

pub struct ClsProvider {
    mode: Mode,
}

impl ClsProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: URL.to_string(),
                referer: "https://www.cls.cn/telegraph",
                query: vec![
                    ("app", "CailianpressWeb".to_string()),
                    ("os", "web".to_string()),
                    ("rn", "20".to_string()),
                    ("sv", "8.4.6".to_string()),
                ],
                client,
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let env: Envelope = serde_json::from_str(s).context("parsing cls telegraph json")?;

        let mut out = Vec::with_capacity(env.data.roll_data.len() + env.vip_global.len());
        for it in env.data.roll_data {
            let tag = match it.level.as_deref() {
                Some("A") => Some(TAG_LEVEL_A.to_string()),
                Some("B") => Some(TAG_LEVEL_B.to_string()),
                _ => None,
            };
            out.push(RawItem::new(NAME, it.content, it.ctime).with_tag(tag));
        }
        for it in env.vip_global {
            out.push(RawItem::new(NAME, it.brief, it.ctime).with_tag(Some(TAG_LEVEL_A.to_string())));
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for ClsProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self.mode.body(NAME).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &str {
        NAME
    }
}
