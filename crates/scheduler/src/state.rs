use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use chunkwise_core::RequestId;

use super::config::SchedulerConfig;
use super::metrics::{LoadMetrics, QueueStatistics};
use super::types::{FailedLoad, InProgressEntry, PriorityTier};

/// Mutable scheduler bookkeeping, guarded as one unit by the scheduler's mutex.
///
/// Tier channels live outside this struct, but every dispatch pop happens
/// while the lock on this state is held.
#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub config: SchedulerConfig,
    pub in_progress: HashMap<RequestId, InProgressEntry>,
    pub completed: HashSet<RequestId>,
    pub failed: HashMap<RequestId, FailedLoad>,
    /// Advisory cancellation markers, consulted at dispatch.
    pub cancelled: HashSet<RequestId>,
    pub metrics: LoadMetrics,
}

impl SchedulerState {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            in_progress: HashMap::new(),
            completed: HashSet::new(),
            failed: HashMap::new(),
            cancelled: HashSet::new(),
            metrics: LoadMetrics::default(),
        }
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        self.completed.contains(id) || self.failed.contains_key(id)
    }

    pub fn at_capacity(&self) -> bool {
        self.in_progress.len() >= self.config.max_concurrent_loads
    }

    pub fn statistics(&self, depths: [usize; 5], now: DateTime<Utc>) -> QueueStatistics {
        let tier_depths: BTreeMap<PriorityTier, usize> =
            PriorityTier::ALL.into_iter().zip(depths).collect();

        QueueStatistics {
            pending: depths.iter().sum(),
            tier_depths,
            in_progress: self.in_progress.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            total_processed: self.metrics.total_processed,
            average_load_time_ms: self.metrics.average_load_time_ms,
            cancellation_markers: self.cancelled.len(),
            admitted: self.metrics.admitted,
            downgraded: self.metrics.downgraded,
            shed: self.metrics.shed,
            discarded_cancelled: self.metrics.discarded_cancelled,
            cancelled_in_flight: self.metrics.cancelled_in_flight,
            max_concurrent_loads: self.config.max_concurrent_loads,
            strategy: self.config.strategy,
            captured_at: now,
        }
    }
}
