// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::Mode;
use crate::ingest::types::{FeedSource, RawItem, SourceTime};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> SourceTime {
    match OffsetDateTime::parse(ts.trim(), &Rfc2822) {
        Ok(dt) => SourceTime::Unix(dt.unix_timestamp()),
        // let the normalizer reject it with the original text in the log
        Err(_) => SourceTime::Text(ts.to_string()),
    }
}

/// Any RSS 2.0 feed, named in config.
pub struct RssProvider {
    name: String,
    mode: Mode,
}

impl RssProvider {
    pub fn from_fixture(name: &str, s: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(name: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                referer: "",
                query: Vec::new(),
                client,
            },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).with_context(|| format!("parsing {} rss xml", self.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.unwrap_or_default();
            let description = it.description.unwrap_or_default();
            let text = match (title.trim().is_empty(), description.trim().is_empty()) {
                (false, false) => format!("{}. {}", title.trim(), description.trim()),
                (false, true) => title,
                (true, _) => description,
            };
            let published = it
                .pub_date
                .as_deref()
                .map(parse_rfc2822)
                .unwrap_or_else(|| SourceTime::Text(String::new()));
            out.push(RawItem::new(self.name.as_str(), text, published));
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let body = self.mode.body(&self.name).await?;
        self.parse_items_from_str(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
