use std::collections::HashMap;

use tracing::{debug, error};

use crate::types::{FailedLoad, LoadOutcome};

use super::ChunkScheduler;

impl ChunkScheduler {
    /// Record the outcome of a dispatched request.
    ///
    /// Unknown ids (never dispatched, cancelled, or already reported) are
    /// ignored, so duplicate and late reports are harmless.
    pub fn report_completion(
        &self,
        id: &str,
        outcome: LoadOutcome,
        metrics: Option<HashMap<String, f64>>,
    ) {
        let now = self.clock.now();
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                error!("Completion for {} dropped: {}", id, e);
                return;
            }
        };

        let Some(entry) = state.in_progress.remove(id) else {
            debug!("Ignoring completion for {}: not in progress", id);
            return;
        };

        let load_time_ms = (now - entry.started_at)
            .num_microseconds()
            .map(|us| us as f64 / 1000.0)
            .unwrap_or(0.0)
            .max(0.0);
        state.metrics.record_load_time(load_time_ms);

        match outcome {
            LoadOutcome::Succeeded => {
                state.metrics.total_processed += 1;
                state.completed.insert(id.to_string());
                debug!(
                    "Request {} (chunk {}) completed in {:.1}ms",
                    id, entry.request.coord, load_time_ms
                );
            }
            LoadOutcome::Failed { error } => {
                debug!(
                    "Request {} (chunk {}) failed after {:.1}ms: {}",
                    id, entry.request.coord, load_time_ms, error
                );
                state.failed.insert(
                    id.to_string(),
                    FailedLoad {
                        id: id.to_string(),
                        error,
                        retry_count: 0,
                        failed_at: now,
                    },
                );
            }
        }

        if let Some(metrics) = metrics {
            state.metrics.merge_custom(metrics);
        }
    }
}
