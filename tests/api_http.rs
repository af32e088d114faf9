// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use hot_news_hub::ingest::types::{FeedSource, RawItem, SourceTime};
use hot_news_hub::notify::BroadcastPublisher;
use hot_news_hub::store::MemoryList;
use hot_news_hub::{create_router, AppState, HotNewsHub, HubConfig};

const BODY_LIMIT: usize = 1024 * 1024;

struct Recent;

#[async_trait::async_trait]
impl FeedSource for Recent {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let now = Utc::now().timestamp();
        Ok(vec![
            RawItem::new("recent", "沪指收涨0.8%，两市成交额超1.2万亿元", SourceTime::Unix(now - 60 * 60)),
            RawItem::new("recent", "<b>央行</b>：保持流动性合理充裕", SourceTime::Unix(now - 2 * 60 * 60)),
            RawItem::new("recent", "", SourceTime::Unix(now)),
        ])
    }
    fn name(&self) -> &str {
        "recent"
    }
}

fn test_router(snapshot_dir: &std::path::Path) -> Router {
    let mut cfg = HubConfig::default();
    cfg.snapshot_dir = snapshot_dir.display().to_string();
    let hub = HotNewsHub::new(
        &cfg,
        Arc::new(MemoryList::new("live")),
        Arc::new(MemoryList::new("bk")),
        Arc::new(BroadcastPublisher::default()),
    )
    .with_source(Box::new(Recent));
    create_router(AppState::new(Arc::new(hub)))
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn call_json(app: &Router, method: &str, uri: &str) -> Json {
    let (status, bytes) = call(app, method, uri).await;
    assert_eq!(status, StatusCode::OK, "{method} {uri}");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());
    let (status, body) = call(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "ok");
}

#[tokio::test]
async fn cycle_then_read_news_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let empty = call_json(&app, "GET", "/news").await;
    assert_eq!(empty.as_array().unwrap().len(), 0);

    let report = call_json(&app, "POST", "/admin/cycle").await;
    assert_eq!(report["fetched"], 3);
    assert_eq!(report["dropped"], 1);
    assert_eq!(report["admitted"], 2);
    assert_eq!(report["backed_up"], 2);

    let news = call_json(&app, "GET", "/news?limit=1").await;
    let news = news.as_array().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0]["content"], "沪指收涨0.8%，两市成交额超1.2万亿元");
    assert!(news[0]["datetime"].as_str().unwrap().len() == 19);

    let all = call_json(&app, "GET", "/news").await;
    assert_eq!(all[1]["content"], "央行：保持流动性合理充裕");

    let stats = call_json(&app, "GET", "/stats").await;
    assert_eq!(stats["live"], 2);
    assert_eq!(stats["durable"], 2);
    assert_eq!(stats["scheduler_running"], false);
}

#[tokio::test]
async fn cleanup_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let nothing = call_json(&app, "POST", "/admin/export").await;
    assert!(nothing["path"].is_null());

    call_json(&app, "POST", "/admin/cycle").await;
    let cleaned = call_json(&app, "POST", "/admin/cleanup").await;
    assert_eq!(cleaned["evicted"], 0);

    let exported = call_json(&app, "POST", "/admin/export").await;
    let path = exported["path"].as_str().unwrap();
    let body = std::fs::read_to_string(path).unwrap();
    let items: Vec<Json> = serde_json::from_str(&body).unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn admin_routes_reject_get() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());
    let (status, _) = call(&app, "GET", "/admin/cycle").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
