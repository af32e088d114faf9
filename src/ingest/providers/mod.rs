// src/ingest/providers/mod.rs
//! Vendor adapters. Each one performs a single bounded GET (or reads an
//! embedded fixture) and maps the vendor payload into [`RawItem`]s.
//!
//! [`RawItem`]: crate::ingest::types::RawItem

pub mod cls;
pub mod rss;
pub mod sina;
pub mod ths;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};

use crate::config::SourcesConfig;
use crate::ingest::types::FeedSource;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Where a provider gets its payload from.
pub(crate) enum Mode {
    Fixture(String),
    Http {
        url: String,
        referer: &'static str,
        query: Vec<(&'static str, String)>,
        client: reqwest::Client,
    },
}

impl Mode {
    pub(crate) async fn body(&self, provider: &str) -> Result<String> {
        match self {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http {
                url,
                referer,
                query,
                client,
            } => {
                let mut headers = HeaderMap::new();
                headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
                if !referer.is_empty() {
                    headers.insert(REFERER, HeaderValue::from_static(*referer));
                }
                client
                    .get(url)
                    .headers(headers)
                    .query(query)
                    .send()
                    .await
                    .with_context(|| format!("{provider} http get()"))?
                    .error_for_status()
                    .with_context(|| format!("{provider} non-2xx"))?
                    .text()
                    .await
                    .with_context(|| format!("{provider} http .text()"))
            }
        }
    }
}

/// Shared HTTP client; every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("building http client")
}

/// Instantiate the sources named in config. Unknown names are logged and skipped.
pub fn build_sources(cfg: &SourcesConfig, timeout: Duration) -> Result<Vec<Box<dyn FeedSource>>> {
    let client = http_client(timeout)?;
    let mut out: Vec<Box<dyn FeedSource>> = Vec::new();
    for name in &cfg.enabled {
        match name.to_ascii_lowercase().as_str() {
            "cls" => out.push(Box::new(cls::ClsProvider::with_client(client.clone()))),
            "ths" => out.push(Box::new(ths::ThsProvider::with_client(client.clone()))),
            "sina" => out.push(Box::new(sina::SinaProvider::with_client(client.clone()))),
            other => tracing::warn!(target: "ingest", provider = other, "unknown provider in config"),
        }
    }
    for feed in &cfg.rss {
        out.push(Box::new(rss::RssProvider::from_url(
            &feed.name,
            &feed.url,
            client.clone(),
        )));
    }
    Ok(out)
}
