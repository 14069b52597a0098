use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info};

use crate::config::{SchedulerConfig, SchedulerConfigUpdate};
use crate::error::SchedulerError;
use crate::metrics::QueueStatistics;
use crate::queues::TierQueues;
use crate::sources::{Clock, NoPressure, PressureSource, SystemClock};
use crate::state::SchedulerState;
use crate::types::FailedLoad;

/// The chunk loading scheduler. Producers admit requests, loader workers
/// pull them with [`get_next_task`](ChunkScheduler::get_next_task) and
/// report back. Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct ChunkScheduler {
    /// Per-tier FIFO channels.
    pub(super) queues: Arc<TierQueues>,
    /// In-progress map, terminal sets, cancellation markers, config and counters.
    pub(super) state: Arc<Mutex<SchedulerState>>,
    /// Time source for dispatch and completion timestamps.
    pub(super) clock: Arc<dyn Clock>,
    /// External resource-pressure signal (adaptive strategy only).
    pub(super) pressure: Arc<dyn PressureSource>,
}

impl ChunkScheduler {
    /// Create a scheduler with the wall clock and no pressure source.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(NoPressure))
    }

    /// Create a scheduler with explicit clock and pressure collaborators.
    /// Invalid configuration fields fall back to their defaults.
    pub fn with_sources(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        pressure: Arc<dyn PressureSource>,
    ) -> Self {
        let config = config.sanitized();
        info!(
            "Chunk scheduler created (strategy: {}, max_concurrent_loads: {})",
            config.strategy, config.max_concurrent_loads
        );
        Self {
            queues: Arc::new(TierQueues::new()),
            state: Arc::new(Mutex::new(SchedulerState::new(config))),
            clock,
            pressure,
        }
    }

    pub(super) fn lock_state(&self) -> Result<MutexGuard<'_, SchedulerState>, SchedulerError> {
        self.state
            .lock()
            .map_err(|e| SchedulerError::LockPoisoned(format!("SchedulerState lock: {}", e)))
    }

    /// Current pressure reading, clamped to `0.0..=1.0`.
    pub fn resource_pressure(&self) -> Option<f64> {
        self.pressure
            .pressure()
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
    }

    /// Snapshot of the active configuration.
    pub fn config(&self) -> SchedulerConfig {
        match self.lock_state() {
            Ok(state) => state.config.clone(),
            Err(e) => {
                error!("{}", e);
                SchedulerConfig::default()
            }
        }
    }

    /// Merge a partial configuration. Takes effect on the next call of any
    /// operation; invalid fields are logged and ignored.
    pub fn update_configuration(&self, update: SchedulerConfigUpdate) {
        match self.lock_state() {
            Ok(mut state) => {
                state.config.apply_update(update);
                info!(
                    "Scheduler configuration updated (strategy: {}, max_concurrent_loads: {})",
                    state.config.strategy, state.config.max_concurrent_loads
                );
            }
            Err(e) => error!("Configuration update dropped: {}", e),
        }
    }

    /// Point-in-time view of tier depths and aggregate counters.
    pub fn get_queue_statistics(&self) -> QueueStatistics {
        let now = self.clock.now();
        match self.lock_state() {
            Ok(state) => state.statistics(self.queues.depths(), now),
            Err(e) => {
                error!("{}", e);
                SchedulerState::new(SchedulerConfig::default())
                    .statistics(self.queues.depths(), now)
            }
        }
    }

    /// Worker-reported metrics merged with the scheduler's own counters.
    pub fn get_performance_metrics(&self) -> HashMap<String, f64> {
        let pending = self.queues.total_depth();
        let pressure = self.resource_pressure();

        let state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("{}", e);
                return HashMap::new();
            }
        };

        let m = &state.metrics;
        let mut out = m.custom.clone();
        out.insert("average_load_time_ms".into(), m.average_load_time_ms);
        out.insert("total_processed".into(), m.total_processed as f64);
        out.insert("completed".into(), state.completed.len() as f64);
        out.insert("failed".into(), state.failed.len() as f64);
        out.insert("in_progress".into(), state.in_progress.len() as f64);
        out.insert("pending".into(), pending as f64);
        out.insert("admitted".into(), m.admitted as f64);
        out.insert("downgraded".into(), m.downgraded as f64);
        out.insert("shed".into(), m.shed as f64);
        out.insert("discarded_cancelled".into(), m.discarded_cancelled as f64);
        out.insert("cancelled_in_flight".into(), m.cancelled_in_flight as f64);
        out.insert("cancellation_markers".into(), state.cancelled.len() as f64);
        if let Some(p) = pressure {
            out.insert("resource_pressure".into(), p);
        }
        out
    }

    /// Whether the id finished successfully.
    pub fn is_completed(&self, id: &str) -> bool {
        self.lock_state()
            .map(|state| state.completed.contains(id))
            .unwrap_or(false)
    }

    /// Failure record for the id, if its load failed.
    pub fn failure(&self, id: &str) -> Option<FailedLoad> {
        self.lock_state()
            .ok()
            .and_then(|state| state.failed.get(id).cloned())
    }

    /// Whether a cancellation marker is currently held for the id.
    pub fn is_cancelled(&self, id: &str) -> bool {
        self.lock_state()
            .map(|state| state.cancelled.contains(id))
            .unwrap_or(false)
    }
}
