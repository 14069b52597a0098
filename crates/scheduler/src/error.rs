use thiserror::Error;

use crate::types::PriorityTier;

/// Errors from a single tier channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("{tier} queue is full")]
    Full { tier: PriorityTier },

    #[error("{tier} queue is disconnected")]
    Disconnected { tier: PriorityTier },
}

/// Errors surfaced to scheduler callers. Only admission can fail.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Even the unbounded background tier refused the request. Not reachable
    /// unless the tier set is internally inconsistent.
    #[error("request {id} could not be queued: every tier is saturated")]
    Saturated { id: String },

    #[error("queue operation failed: {0}")]
    Queue(#[from] QueueError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}
