use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{PriorityTier, StrategyKind};

/// Rolling counters kept inside the scheduler state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadMetrics {
    /// Requests accepted by admission.
    pub admitted: u64,
    /// Downgrade steps taken because a tier was saturated.
    pub downgraded: u64,
    /// Requests evicted by adaptive load shedding.
    pub shed: u64,
    /// Cancelled entries discarded at dispatch time.
    pub discarded_cancelled: u64,
    /// In-progress entries removed by cancellation.
    pub cancelled_in_flight: u64,
    /// Successful loads.
    pub total_processed: u64,
    /// Completions (success or failure) contributing to the average.
    pub latency_samples: u64,
    /// Rolling mean load time in milliseconds.
    pub average_load_time_ms: f64,
    /// Worker-reported metrics, last value wins.
    pub custom: HashMap<String, f64>,
}

impl LoadMetrics {
    /// Fold one load time into the rolling mean.
    pub fn record_load_time(&mut self, load_time_ms: f64) {
        let n = self.latency_samples as f64;
        self.average_load_time_ms = (self.average_load_time_ms * n + load_time_ms) / (n + 1.0);
        self.latency_samples += 1;
    }

    pub fn merge_custom(&mut self, metrics: HashMap<String, f64>) {
        self.custom.extend(metrics);
    }
}

/// Read-only snapshot returned by [`crate::ChunkScheduler::get_queue_statistics`].
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatistics {
    pub tier_depths: BTreeMap<PriorityTier, usize>,
    /// Sum of all tier depths, including cancelled entries not yet discarded.
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_processed: u64,
    pub average_load_time_ms: f64,
    pub cancellation_markers: usize,
    pub admitted: u64,
    pub downgraded: u64,
    pub shed: u64,
    pub discarded_cancelled: u64,
    pub cancelled_in_flight: u64,
    pub max_concurrent_loads: usize,
    pub strategy: StrategyKind,
    pub captured_at: DateTime<Utc>,
}

impl QueueStatistics {
    pub fn depth(&self, tier: PriorityTier) -> usize {
        self.tier_depths.get(&tier).copied().unwrap_or(0)
    }

    /// Requests accounted for anywhere, including those that left the
    /// system through cancellation.
    pub fn accounted(&self) -> u64 {
        (self.pending + self.in_progress + self.completed + self.failed) as u64
            + self.discarded_cancelled
            + self.cancelled_in_flight
    }
}
