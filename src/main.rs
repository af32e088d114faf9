//! Hot news hub: binary entrypoint.
//! Boots the scheduler and the Axum HTTP server around one `HotNewsHub`.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use hot_news_hub::{
    api, config, init_tracing, metrics::Metrics, spawn_scheduler, HotNewsHub, SchedulerCfg,
};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading hub config")?;
    let metrics = Metrics::install()?;

    let (hub, _local) = HotNewsHub::from_config(&cfg)?;
    let hub = Arc::new(hub);
    tracing::info!(
        target: "scheduler",
        sources = ?hub.source_names(),
        retention_days = cfg.retention_days,
        "hub ready"
    );

    let scheduler = spawn_scheduler(hub.clone(), SchedulerCfg::from_config(&cfg));
    let state = api::AppState::new(hub).with_scheduler(scheduler);
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
