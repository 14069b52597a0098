use tracing::{debug, error, info};

use super::ChunkScheduler;

impl ChunkScheduler {
    /// Mark a request as cancelled.
    ///
    /// Best effort: a queued request stays in its tier channel and is
    /// discarded when dispatch reaches it. An in-progress request loses its
    /// bookkeeping entry, but the worker executing it is not interrupted and
    /// no completion or failure record is written.
    ///
    /// Returns `true` when a marker was recorded for a request that is in
    /// progress or presumed queued, `false` when the id is already terminal
    /// or was already cancelled.
    pub fn cancel_request(&self, id: &str, reason: Option<&str>) -> bool {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Cancellation of {} dropped: {}", id, e);
                return false;
            }
        };

        if state.is_terminal(id) {
            debug!("Not cancelling {}: already finished", id);
            return false;
        }

        let newly_marked = state.cancelled.insert(id.to_string());
        let was_running = state.in_progress.remove(id).is_some();
        if was_running {
            state.metrics.cancelled_in_flight += 1;
        }

        match (was_running, reason) {
            (true, Some(reason)) => info!("Cancelled in-progress request {}: {}", id, reason),
            (true, None) => info!("Cancelled in-progress request {}", id),
            (false, Some(reason)) => debug!("Marked request {} cancelled: {}", id, reason),
            (false, None) => debug!("Marked request {} cancelled", id),
        }

        newly_marked || was_running
    }
}
