use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::hub::{CycleReport, HotNewsHub};
use crate::news::NewsItem;
use crate::scheduler::SchedulerHandle;

pub const DEFAULT_NEWS_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<HotNewsHub>,
    /// Held here so the scheduler lives exactly as long as the router.
    pub scheduler: Option<Arc<SchedulerHandle>>,
}

impl AppState {
    pub fn new(hub: Arc<HotNewsHub>) -> Self {
        Self {
            hub,
            scheduler: None,
        }
    }

    pub fn with_scheduler(mut self, handle: SchedulerHandle) -> Self {
        self.scheduler = Some(Arc::new(handle));
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(news))
        .route("/stats", get(stats))
        .route("/admin/cycle", post(admin_cycle))
        .route("/admin/cleanup", post(admin_cleanup))
        .route("/admin/export", post(admin_export))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Maps any orchestration failure to a 500 with the error chain as text.
struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(target: "store", "request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

#[derive(Deserialize)]
struct NewsQuery {
    limit: Option<usize>,
}

async fn news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
    Ok(Json(state.hub.latest(limit).await?))
}

#[derive(Serialize)]
struct StatsOut {
    live: usize,
    durable: usize,
    scheduler_running: bool,
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsOut>, ApiError> {
    let s = state.hub.stats().await?;
    Ok(Json(StatsOut {
        live: s.live,
        durable: s.durable,
        scheduler_running: state.scheduler.as_ref().is_some_and(|h| h.is_running()),
    }))
}

async fn admin_cycle(State(state): State<AppState>) -> Result<Json<CycleReport>, ApiError> {
    let now = state.hub.now();
    Ok(Json(state.hub.run_cycle(now).await?))
}

#[derive(Serialize)]
struct CleanupOut {
    evicted: usize,
}

async fn admin_cleanup(State(state): State<AppState>) -> Result<Json<CleanupOut>, ApiError> {
    let now = state.hub.now();
    let evicted = state.hub.clean_expired(now).await?;
    Ok(Json(CleanupOut { evicted }))
}

#[derive(Serialize)]
struct ExportOut {
    path: Option<String>,
}

async fn admin_export(State(state): State<AppState>) -> Result<Json<ExportOut>, ApiError> {
    let path = state.hub.export_snapshot().await?;
    Ok(Json(ExportOut {
        path: path.map(|p| p.display().to_string()),
    }))
}
