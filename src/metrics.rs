// src/metrics.rs
use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static DESCRIBED: OnceCell<()> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Only the first call in a
    /// process can succeed.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Register help text for every series the hub emits, once per process.
pub fn describe() {
    DESCRIBED.get_or_init(describe_all);
}

fn describe_all() {
    describe_counter!("ingest_events_total", "Raw items returned by sources.");
    describe_counter!("ingest_dropped_total", "Raw items rejected by normalization.");
    describe_counter!("ingest_source_errors_total", "Source calls that failed or timed out.");
    describe_histogram!("ingest_fetch_ms", "Source call duration in milliseconds.");
    describe_counter!("dedup_exact_total", "Items dropped as exact duplicates.");
    describe_counter!("dedup_near_total", "Items dropped as near-duplicates.");
    describe_counter!("retention_evicted_total", "Items evicted by the retention window.");
    describe_counter!("live_admitted_total", "Items newly admitted to the live collection.");
    describe_gauge!("live_items", "Items currently in the live collection.");
    describe_counter!("backup_appended_total", "Items appended to the durable log.");
    describe_counter!("backup_restored_total", "Items restored from the durable log.");
    describe_gauge!("durable_items", "Items in the durable log.");
    describe_counter!("store_torn_records_total", "Incomplete trailing records cut from file stores before an append.");
    describe_counter!("notify_published_total", "Change events published.");
    describe_counter!("notify_errors_total", "Change events dropped or failed to publish.");
    describe_counter!("cycle_runs_total", "Update cycles started.");
    describe_counter!("cycle_errors_total", "Update cycles that failed.");
    describe_gauge!("cycle_last_run_ts", "Unix time of the last finished cycle.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{counter, gauge};

    #[test]
    fn described_series_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            describe_all();
            counter!("cycle_runs_total").increment(2);
            gauge!("live_items").set(7.0);
        });

        let out = handle.render();
        assert!(out.contains("# HELP cycle_runs_total Update cycles started."));
        assert!(out.contains("cycle_runs_total 2"));
        assert!(out.contains("live_items 7"));
    }
}
