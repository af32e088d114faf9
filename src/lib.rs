// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod backup;
pub mod config;
pub mod dedup;
pub mod hub;
pub mod ingest;
pub mod live;
pub mod metrics;
pub mod news;
pub mod notify;
pub mod retention;
pub mod scheduler;
pub mod snapshot;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::HubConfig;
pub use crate::hub::{CycleReport, HotNewsHub};
pub use crate::news::NewsItem;
pub use crate::scheduler::{spawn_scheduler, SchedulerCfg, SchedulerHandle};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "HOT_NEWS_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` picks the filter;
/// `HOT_NEWS_LOG_JSON=1` switches to JSON lines. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ingest=info,backup=info"));
    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
