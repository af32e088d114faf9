// tests/config_load.rs
use hot_news_hub::config::{load_default, load_from, StoreBackend};
use std::{env, fs};

const ENV_VARS: [&str; 5] = [
    "HOT_NEWS_CONFIG",
    "HOT_NEWS_RETENTION_DAYS",
    "HOT_NEWS_CYCLE_INTERVAL_SECS",
    "HOT_NEWS_STORE_DIR",
    "HOT_NEWS_WEBHOOK_URL",
];

fn clear_env() {
    for v in ENV_VARS {
        env::remove_var(v);
    }
}

#[serial_test::serial]
#[test]
fn parse_toml_and_json_paths() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("hub.toml");
    fs::write(
        &p_toml,
        r#"
retention_days = 14
cycle_interval_secs = 30

[store]
backend = "memory"

[sources]
enabled = ["cls"]
rss = [{ name = "fed", url = "https://www.federalreserve.gov/feeds/press_all.xml" }]
"#,
    )
    .unwrap();
    let cfg = load_from(&p_toml).unwrap();
    assert_eq!(cfg.retention_days, 14);
    assert_eq!(cfg.cycle_interval_secs, 30);
    assert_eq!(cfg.store.backend, StoreBackend::Memory);
    assert_eq!(cfg.sources.enabled, vec!["cls".to_string()]);
    assert_eq!(cfg.sources.rss[0].name, "fed");

    let p_json = dir.path().join("hub.json");
    fs::write(&p_json, r#"{"utc_offset_minutes": 0, "dedup": {"similarity_threshold": 0.8}}"#).unwrap();
    let cj = load_from(&p_json).unwrap();
    assert_eq!(cj.utc_offset_minutes, 0);
    assert_eq!(cj.dedup.similarity_threshold, 0.8);
    assert_eq!(cj.retention_days, 30);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk → defaults
    let d = load_default().unwrap();
    assert_eq!(d.retention_days, 30);
    assert_eq!(d.store.backend, StoreBackend::File);

    // 2) fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("hot_news.toml"), "retention_days = 7\n").unwrap();
    assert_eq!(load_default().unwrap().retention_days, 7);

    // 3) explicit path wins
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"{"retention_days": 3}"#).unwrap();
    env::set_var("HOT_NEWS_CONFIG", p_env.display().to_string());
    assert_eq!(load_default().unwrap().retention_days, 3);

    // 4) a dangling explicit path is an error, not a silent fallback
    env::set_var("HOT_NEWS_CONFIG", tmp.path().join("missing.toml").display().to_string());
    assert!(load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top_of_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("hub.toml");
    fs::write(&p, "retention_days = 14\n").unwrap();

    clear_env();
    env::set_var("HOT_NEWS_RETENTION_DAYS", "45");
    env::set_var("HOT_NEWS_CYCLE_INTERVAL_SECS", "not-a-number");
    env::set_var("HOT_NEWS_STORE_DIR", " /var/lib/hot-news ");
    env::set_var("HOT_NEWS_WEBHOOK_URL", "http://127.0.0.1:8080/hook");

    let cfg = load_from(&p).unwrap();
    assert_eq!(cfg.retention_days, 45);
    assert_eq!(cfg.cycle_interval_secs, 60);
    assert_eq!(cfg.store.dir, "/var/lib/hot-news");
    assert_eq!(cfg.notify.webhook_url.as_deref(), Some("http://127.0.0.1:8080/hook"));

    clear_env();
}
