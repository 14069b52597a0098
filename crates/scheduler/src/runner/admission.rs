use tracing::{debug, error};

use crate::error::{QueueError, SchedulerError};
use crate::strategy::effective_priority;
use crate::types::{LoadingRequest, PriorityTier, StrategyKind};

use super::ChunkScheduler;

impl ChunkScheduler {
    /// Admit a load request.
    ///
    /// The active strategy picks the effective tier; if that tier is full the
    /// request moves one tier down and tries again, ending at the unbounded
    /// background tier. Returns the tier the request was queued in.
    ///
    /// The state lock is held across the push so the admission counters
    /// never lag behind the queue depths a concurrent snapshot observes.
    pub fn schedule_load(&self, request: LoadingRequest) -> Result<PriorityTier, SchedulerError> {
        let mut state = self.lock_state()?;
        let config = &state.config;

        let pressure = match config.strategy {
            StrategyKind::Adaptive => self.resource_pressure(),
            _ => None,
        };
        let tier = effective_priority(config.strategy, &request, pressure, config);
        if tier != request.priority {
            debug!(
                "Request {} resolved {} -> {} by {} strategy",
                request.id, request.priority, tier, config.strategy
            );
        }

        let mut request = request.with_priority(tier);
        let mut downgrades = 0u64;

        let landed = loop {
            let tier = request.priority;
            match self.queues.try_push(request) {
                Ok(()) => break tier,
                Err((QueueError::Full { .. }, rejected)) => {
                    if tier == PriorityTier::Background {
                        error!("Background tier rejected request {}", rejected.id);
                        return Err(SchedulerError::Saturated { id: rejected.id });
                    }
                    let next = tier.downgrade();
                    debug!("{} tier full, downgrading request {} to {}", tier, rejected.id, next);
                    downgrades += 1;
                    request = rejected.with_priority(next);
                }
                Err((e, rejected)) => {
                    error!("Failed to queue request {}: {}", rejected.id, e);
                    return Err(e.into());
                }
            }
        };

        state.metrics.admitted += 1;
        state.metrics.downgraded += downgrades;

        Ok(landed)
    }
}
