use tracing::{debug, error, info, warn};

use crate::state::SchedulerState;
use crate::strategy::should_shed;
use crate::types::{PriorityTier, StrategyKind};

use super::ChunkScheduler;

/// Tiers evicted by adaptive load shedding.
const SHED_TIERS: [PriorityTier; 2] = [PriorityTier::Low, PriorityTier::Background];

impl ChunkScheduler {
    /// Drop cancellation markers whose request has completed or failed.
    /// Returns the number of markers pruned.
    pub fn cleanup_cancellations(&self) -> usize {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Cancellation cleanup skipped: {}", e);
                return 0;
            }
        };

        let SchedulerState {
            cancelled,
            completed,
            failed,
            ..
        } = &mut *state;

        let before = cancelled.len();
        cancelled.retain(|id| !completed.contains(id) && !failed.contains_key(id));
        let pruned = before - cancelled.len();

        if pruned > 0 {
            info!("Pruned {} cancellation markers ({} remain)", pruned, cancelled.len());
        } else {
            debug!("No cancellation markers to prune ({} held)", cancelled.len());
        }
        pruned
    }

    /// Adaptive load shedding.
    ///
    /// When the adaptive strategy is active and pressure exceeds the
    /// critical mark, every request queued in the Low and Background tiers is
    /// evicted and discarded, not downgraded. Producers must re-submit them.
    /// Returns the number of evicted requests.
    pub fn rebalance(&self) -> usize {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Rebalance skipped: {}", e);
                return 0;
            }
        };

        if state.config.strategy != StrategyKind::Adaptive {
            return 0;
        }

        let pressure = self.resource_pressure();
        if !should_shed(pressure, &state.config) {
            debug!("Rebalance: pressure {:?} below critical mark", pressure);
            return 0;
        }

        let mut evicted = 0usize;
        for tier in SHED_TIERS {
            let dropped = self.queues.drain(tier);
            for request in &dropped {
                debug!("Shed request {} ({} tier, chunk {})", request.id, tier, request.coord);
            }
            evicted += dropped.len();
        }

        state.metrics.shed += evicted as u64;
        if evicted > 0 {
            warn!(
                "Load shedding: evicted {} queued low/background requests at pressure {:.2}",
                evicted,
                pressure.unwrap_or_default()
            );
        }
        evicted
    }
}
