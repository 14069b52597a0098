use tracing::{debug, error};

use crate::types::{InProgressEntry, LoadingRequest, PriorityTier};

use super::ChunkScheduler;

impl ChunkScheduler {
    /// Hand out the next request to a loader worker, or `None` when the
    /// concurrency ceiling is reached or nothing runnable is queued.
    ///
    /// Tiers are scanned Critical to Background. Entries carrying a
    /// cancellation marker are discarded; after `max_dispatch_skips`
    /// consecutive discards the call gives up and returns `None`.
    /// The state lock is held for the whole scan, so the ceiling check and
    /// the in-progress insertion are one atomic step.
    pub fn get_next_task(&self) -> Option<LoadingRequest> {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Dispatch skipped: {}", e);
                return None;
            }
        };

        if state.at_capacity() {
            return None;
        }

        let max_skips = state.config.max_dispatch_skips;
        let mut skips = 0usize;

        for tier in PriorityTier::ALL {
            loop {
                let request = match self.queues.try_pop(tier) {
                    Ok(Some(request)) => request,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Dispatch poll failed: {}", e);
                        return None;
                    }
                };

                if state.cancelled.contains(&request.id) {
                    debug!("Discarding cancelled request {} from {} tier", request.id, tier);
                    state.metrics.discarded_cancelled += 1;
                    skips += 1;
                    if skips >= max_skips {
                        debug!("Dispatch gave up after {} cancelled entries", skips);
                        return None;
                    }
                    continue;
                }

                let started_at = self.clock.now();
                state.in_progress.insert(
                    request.id.clone(),
                    InProgressEntry {
                        request: request.clone(),
                        started_at,
                    },
                );
                debug!("Dispatched request {} ({} tier) for chunk {}", request.id, tier, request.coord);
                return Some(request);
            }
        }

        None
    }
}
