//! One-off export of the live collection to `hot_news_<unix>.json`.
//! Usage: `export-snapshot [OUT_DIR]` (defaults to `snapshot_dir` from config).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use hot_news_hub::store::{self, ListStore};
use hot_news_hub::{config, init_tracing, snapshot};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading hub config")?;
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.snapshot_dir));

    let stores = store::open(&cfg.store);
    let items = stores
        .live
        .get_all()
        .await
        .with_context(|| format!("reading {}", cfg.store.live_key))?;

    match snapshot::write_snapshot(&items, &out_dir, Utc::now().timestamp()).await? {
        Some(path) => println!("exported {} items to {}", items.len(), path.display()),
        None => println!("live collection is empty, nothing exported"),
    }
    Ok(())
}
