//! One FIFO channel per priority tier.
//!
//! Each tier is an independent `crossbeam-channel`: bounded for
//! Critical..Low, unbounded for Background. Pushes and pops never block;
//! a full bounded tier reports [`QueueError::Full`] so admission can
//! downgrade instead of waiting.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};

use crate::error::QueueError;
use crate::types::{LoadingRequest, PriorityTier};

struct TierChannel {
    tx: Sender<LoadingRequest>,
    rx: Receiver<LoadingRequest>,
}

impl TierChannel {
    fn for_tier(tier: PriorityTier) -> Self {
        let (tx, rx) = match tier.capacity() {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };
        Self { tx, rx }
    }
}

/// The five tier channels. Both ends are owned here, so disconnection
/// only happens if the set itself is dropped.
pub struct TierQueues {
    tiers: [TierChannel; 5],
}

impl TierQueues {
    pub fn new() -> Self {
        Self {
            tiers: PriorityTier::ALL.map(TierChannel::for_tier),
        }
    }

    /// Non-blocking enqueue into the tier named by `request.priority`.
    ///
    /// On failure the request is handed back so the caller can retry
    /// it in another tier.
    pub fn try_push(
        &self,
        request: LoadingRequest,
    ) -> Result<(), (QueueError, LoadingRequest)> {
        let tier = request.priority;
        match self.tiers[tier.index()].tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(request)) => Err((QueueError::Full { tier }, request)),
            Err(TrySendError::Disconnected(request)) => {
                Err((QueueError::Disconnected { tier }, request))
            }
        }
    }

    /// Non-blocking dequeue from one tier.
    pub fn try_pop(&self, tier: PriorityTier) -> Result<Option<LoadingRequest>, QueueError> {
        match self.tiers[tier.index()].rx.try_recv() {
            Ok(request) => Ok(Some(request)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(QueueError::Disconnected { tier }),
        }
    }

    /// Remove and return everything currently queued in a tier.
    pub fn drain(&self, tier: PriorityTier) -> Vec<LoadingRequest> {
        self.tiers[tier.index()].rx.try_iter().collect()
    }

    pub fn depth(&self, tier: PriorityTier) -> usize {
        self.tiers[tier.index()].rx.len()
    }

    pub fn depths(&self) -> [usize; 5] {
        PriorityTier::ALL.map(|tier| self.depth(tier))
    }

    pub fn total_depth(&self) -> usize {
        self.depths().iter().sum()
    }

    pub fn is_full(&self, tier: PriorityTier) -> bool {
        self.tiers[tier.index()].tx.is_full()
    }
}

impl Default for TierQueues {
    fn default() -> Self {
        Self::new()
    }
}
