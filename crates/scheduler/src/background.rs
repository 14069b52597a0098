//! Periodic maintenance tasks: cancellation-marker cleanup and adaptive
//! rebalancing. Both run on the tokio runtime and stop when the shared
//! `watch` shutdown flag flips to `true`.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::runner::ChunkScheduler;

/// Spawn the cleanup job: every `interval`, prune cancellation markers of
/// requests that have completed or failed.
pub fn spawn_cleanup_task(
    scheduler: ChunkScheduler,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so the first sweep
        // happens one full interval after start.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let pruned = scheduler.cleanup_cancellations();
                    debug!(pruned, "cancellation cleanup tick");
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("cancellation cleanup task stopped");
    })
}

/// Spawn the rebalance loop. Each tick is a no-op unless the adaptive
/// strategy is active and pressure is above the critical mark.
pub fn spawn_rebalance_task(
    scheduler: ChunkScheduler,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = scheduler.rebalance();
                    debug!(evicted, "rebalance tick");
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("rebalance task stopped");
    })
}

/// Handles to the scheduler's background tasks.
pub struct BackgroundJobs {
    shutdown: watch::Sender<bool>,
    cleanup: JoinHandle<()>,
    rebalance: JoinHandle<()>,
}

impl BackgroundJobs {
    /// Start both tasks with the intervals from the scheduler's configuration.
    pub fn spawn(scheduler: &ChunkScheduler) -> Self {
        let config = scheduler.config();
        Self::spawn_with_intervals(
            scheduler,
            config.cleanup_interval(),
            config.rebalance_interval(),
        )
    }

    pub fn spawn_with_intervals(
        scheduler: &ChunkScheduler,
        cleanup_interval: Duration,
        rebalance_interval: Duration,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        info!(
            ?cleanup_interval,
            ?rebalance_interval,
            "starting scheduler background jobs"
        );
        Self {
            cleanup: spawn_cleanup_task(scheduler.clone(), cleanup_interval, rx.clone()),
            rebalance: spawn_rebalance_task(scheduler.clone(), rebalance_interval, rx),
            shutdown,
        }
    }

    /// Signal both tasks and wait for them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.cleanup.await;
        let _ = self.rebalance.await;
        info!("scheduler background jobs stopped");
    }
}
