// tests/providers.rs
use std::time::Duration;

use chrono::{FixedOffset, NaiveDateTime};
use hot_news_hub::ingest::{
    ingest_once,
    providers::{cls::ClsProvider, rss::RssProvider, sina::SinaProvider, ths::ThsProvider},
    types::{FeedSource, SourceTime},
};
use hot_news_hub::news::CIVIL_FORMAT;

const CLS: &str = include_str!("fixtures/cls.json");
const THS: &str = include_str!("fixtures/ths.json");
const SINA: &str = include_str!("fixtures/sina.json");
const RSS: &str = include_str!("fixtures/rss.xml");

fn cst() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

fn civil(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, CIVIL_FORMAT).unwrap()
}

#[tokio::test]
async fn cls_fixture_maps_roll_data_and_vip_items() {
    let items = ClsProvider::from_fixture(CLS).fetch_latest().await.unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|it| it.source == "cls"));
    assert_eq!(items[0].published, SourceTime::Unix(1_741_915_800));
    assert_eq!(items[0].tag.as_deref(), Some("-21101"));
    assert_eq!(items[1].tag.as_deref(), Some("21111"));
    assert_eq!(items[2].tag, None);
    assert_eq!(items[3].content, "美联储官员：通胀回落进程仍在继续。");
    assert_eq!(items[3].tag.as_deref(), Some("-21101"));
}

#[tokio::test]
async fn ths_fixture_keeps_string_ctime() {
    let items = ThsProvider::from_fixture(THS).fetch_latest().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].published, SourceTime::Text("1741930200".into()));
    assert_eq!(items[0].tag.as_deref(), Some("-21101"));
    assert_eq!(items[1].tag, None);
}

#[tokio::test]
async fn sina_and_rss_fixtures_parse() {
    let sina = SinaProvider::from_fixture(SINA).fetch_latest().await.unwrap();
    assert_eq!(sina.len(), 2);
    assert_eq!(sina[1].published, SourceTime::Text("2025-03-14 15:40:00".into()));

    let fed = RssProvider::from_fixture("fed", RSS);
    assert_eq!(fed.name(), "fed");
    let rss = fed.fetch_latest().await.unwrap();
    assert_eq!(rss.len(), 2);
    assert!(rss[0].content.starts_with("Federal Reserve issues FOMC statement. Recent indicators"));
}

#[tokio::test]
async fn wrong_envelope_is_an_error_not_an_empty_batch() {
    assert!(ClsProvider::from_fixture(SINA).fetch_latest().await.is_err());
    assert!(SinaProvider::from_fixture(THS).fetch_latest().await.is_err());
}

#[tokio::test]
async fn all_fixtures_normalize_into_one_batch() {
    let sources: Vec<Box<dyn FeedSource>> = vec![
        Box::new(ClsProvider::from_fixture(CLS)),
        Box::new(ThsProvider::from_fixture(THS)),
        Box::new(SinaProvider::from_fixture(SINA)),
        Box::new(RssProvider::from_fixture("fed", RSS)),
    ];
    let batch = ingest_once(&sources, Duration::from_secs(5), cst()).await;

    assert_eq!(batch.fetched, 10);
    assert_eq!(batch.source_errors, 0);
    // rss item with "not a date"
    assert_eq!(batch.dropped, 1);
    assert_eq!(batch.items.len(), 9);

    let pboc = batch
        .items
        .iter()
        .find(|it| it.content.starts_with("【央行开展逆回购操作】"))
        .unwrap();
    assert_eq!(
        pboc.content,
        "【央行开展逆回购操作】财联社3月14日电，央行今日开展 1000亿元7天期逆回购操作。"
    );
    assert_eq!(pboc.published_at, civil("2025-03-14 09:30:00"));

    let fomc = batch
        .items
        .iter()
        .find(|it| it.content.starts_with("Federal Reserve"))
        .unwrap();
    assert_eq!(fomc.published_at, civil("2025-03-14 09:30:00"));
    assert!(fomc.content.contains("suggest that"));

    let gold = batch
        .items
        .iter()
        .find(|it| it.content.starts_with("国际金价"))
        .unwrap();
    assert_eq!(gold.published_at, civil("2025-03-14 15:40:00"));
}
