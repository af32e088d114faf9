// src/scheduler.rs
//! Background driver: one update cycle per `cycle_interval` (the first right
//! away) and a retention pass per `cleanup_interval`. A failed cycle is
//! retried once `error_cooldown` has passed.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use crate::config::HubConfig;
use crate::hub::HotNewsHub;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub cycle_interval: Duration,
    pub cleanup_interval: Duration,
    pub error_cooldown: Duration,
}

impl SchedulerCfg {
    pub fn from_config(cfg: &HubConfig) -> Self {
        Self {
            cycle_interval: cfg.cycle_interval(),
            cleanup_interval: cfg.cleanup_interval(),
            error_cooldown: cfg.error_cooldown(),
        }
    }
}

/// Dropping the handle stops the loop at its next wake-up.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Signal the loop and wait for it. A cycle in flight finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(target: "scheduler", error = ?e, "scheduler task ended abnormally");
        }
    }
}

pub fn spawn_scheduler(hub: Arc<HotNewsHub>, cfg: SchedulerCfg) -> SchedulerHandle {
    let (tx, mut rx) = watch::channel(false);
    let join = tokio::spawn(async move {
        let mut cycle = interval(cfg.cycle_interval);
        cycle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cleanup = interval_at(Instant::now() + cfg.cleanup_interval, cfg.cleanup_interval);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            target: "scheduler",
            cycle_secs = cfg.cycle_interval.as_secs(),
            cleanup_secs = cfg.cleanup_interval.as_secs(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = rx.changed() => break,
                _ = cycle.tick() => {
                    if let Err(e) = hub.run_cycle(hub.now()).await {
                        counter!("cycle_errors_total").increment(1);
                        tracing::warn!(
                            target: "scheduler",
                            cooldown_secs = cfg.error_cooldown.as_secs(),
                            "cycle failed: {e:#}"
                        );
                        tokio::select! {
                            biased;
                            _ = rx.changed() => break,
                            _ = tokio::time::sleep(cfg.error_cooldown) => {}
                        }
                        cycle.reset_immediately();
                    }
                }
                _ = cleanup.tick() => {
                    match hub.clean_expired(hub.now()).await {
                        Ok(n) => tracing::debug!(target: "scheduler", evicted = n, "cleanup tick"),
                        Err(e) => tracing::warn!(target: "scheduler", "cleanup failed: {e:#}"),
                    }
                }
            }
        }
        tracing::info!(target: "scheduler", "scheduler stopped");
    });
    SchedulerHandle { shutdown: tx, join }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{FeedSource, RawItem, SourceTime};
    use crate::notify::BroadcastPublisher;
    use crate::store::MemoryList;
    use anyhow::Result;

    struct OneShot;

    #[async_trait::async_trait]
    impl FeedSource for OneShot {
        async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
            Ok(vec![RawItem::new(
                "one",
                "央行开展逆回购操作",
                SourceTime::Unix(chrono::Utc::now().timestamp()),
            )])
        }
        fn name(&self) -> &str {
            "one"
        }
    }

    #[tokio::test]
    async fn first_cycle_runs_immediately_and_shutdown_stops_the_loop() {
        let cfg = HubConfig::default();
        let hub = Arc::new(
            HotNewsHub::new(
                &cfg,
                Arc::new(MemoryList::new("live")),
                Arc::new(MemoryList::new("bk")),
                Arc::new(BroadcastPublisher::default()),
            )
            .with_source(Box::new(OneShot)),
        );
        let handle = spawn_scheduler(
            hub.clone(),
            SchedulerCfg {
                cycle_interval: Duration::from_secs(3600),
                cleanup_interval: Duration::from_secs(3600),
                error_cooldown: Duration::from_secs(1),
            },
        );

        let mut live = 0;
        for _ in 0..200 {
            live = hub.stats().await.unwrap().live;
            if live > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(live, 1);
        assert!(handle.is_running());
        handle.shutdown().await;
    }
}
