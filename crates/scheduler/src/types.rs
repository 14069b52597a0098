use std::str::FromStr;

use chrono::{DateTime, Utc};
use chunkwise_core::{ChunkCoord, ChunkwiseError, RequestId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Load priority tier. Declaration order is dispatch order: lower = more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    /// Chunks the player is standing in or about to enter.
    Critical,
    /// Visible, near-player chunks.
    High,
    /// Default for ordinary streaming.
    Normal,
    /// Far chunks and prefetch.
    Low,
    /// Unbounded overflow tier; never rejects.
    Background,
}

impl PriorityTier {
    /// All tiers in strict dispatch order.
    pub const ALL: [PriorityTier; 5] = [
        PriorityTier::Critical,
        PriorityTier::High,
        PriorityTier::Normal,
        PriorityTier::Low,
        PriorityTier::Background,
    ];

    /// One step toward `Background`. `Background` is absorbing.
    pub fn downgrade(self) -> Self {
        match self {
            PriorityTier::Critical => PriorityTier::High,
            PriorityTier::High => PriorityTier::Normal,
            PriorityTier::Normal => PriorityTier::Low,
            PriorityTier::Low => PriorityTier::Background,
            PriorityTier::Background => PriorityTier::Background,
        }
    }

    /// Fixed queue capacity for this tier. `None` means unbounded.
    pub fn capacity(self) -> Option<usize> {
        match self {
            PriorityTier::Critical => Some(20),
            PriorityTier::High => Some(50),
            PriorityTier::Normal => Some(100),
            PriorityTier::Low => Some(200),
            PriorityTier::Background => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityTier::Critical => "critical",
            PriorityTier::High => "high",
            PriorityTier::Normal => "normal",
            PriorityTier::Low => "low",
            PriorityTier::Background => "background",
        }
    }
}

impl std::fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to load one chunk.
///
/// Requests are immutable; a downgrade produces a new value via
/// [`LoadingRequest::with_priority`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingRequest {
    pub id: RequestId,
    pub coord: ChunkCoord,
    pub priority: PriorityTier,
    /// Distance from the player in world units.
    pub distance: f64,
    pub requested_at: DateTime<Utc>,
}

impl LoadingRequest {
    /// Create a request with a fresh v4 UUID id.
    pub fn new(coord: ChunkCoord, priority: PriorityTier, distance: f64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), coord, priority, distance)
    }

    /// Create a request with a caller-chosen id.
    pub fn with_id(
        id: impl Into<RequestId>,
        coord: ChunkCoord,
        priority: PriorityTier,
        distance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            coord,
            priority,
            distance,
            requested_at: Utc::now(),
        }
    }

    pub fn with_priority(self, priority: PriorityTier) -> Self {
        Self { priority, ..self }
    }
}

/// Scheduling strategy used to resolve a request's effective tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Caller priority verbatim; FIFO within a tier.
    Fifo,
    /// Caller priority verbatim.
    #[default]
    Priority,
    /// Tier derived from distance, caller priority ignored.
    Distance,
    /// Caller priority, downgraded under resource pressure.
    Adaptive,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Fifo => "fifo",
            StrategyKind::Priority => "priority",
            StrategyKind::Distance => "distance",
            StrategyKind::Adaptive => "adaptive",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = ChunkwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(StrategyKind::Fifo),
            "priority" | "priority_based" | "priority-based" => Ok(StrategyKind::Priority),
            "distance" | "distance_based" | "distance-based" => Ok(StrategyKind::Distance),
            "adaptive" => Ok(StrategyKind::Adaptive),
            other => Err(ChunkwiseError::UnknownStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a worker finished a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Succeeded,
    Failed { error: String },
}

impl LoadOutcome {
    /// For callers that only track a success flag.
    pub fn from_success(success: bool) -> Self {
        if success {
            LoadOutcome::Succeeded
        } else {
            LoadOutcome::Failed {
                error: "load failed".to_string(),
            }
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        LoadOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Succeeded)
    }
}

/// Terminal record of a failed load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedLoad {
    pub id: RequestId,
    pub error: String,
    pub retry_count: u32,
    pub failed_at: DateTime<Utc>,
}

/// Bookkeeping for a dispatched request. Owned by the scheduler state.
#[derive(Debug, Clone)]
pub(crate) struct InProgressEntry {
    pub request: LoadingRequest,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering() {
        assert!(PriorityTier::Critical < PriorityTier::High);
        assert!(PriorityTier::High < PriorityTier::Normal);
        assert!(PriorityTier::Normal < PriorityTier::Low);
        assert!(PriorityTier::Low < PriorityTier::Background);
    }

    #[test]
    fn downgrade_is_monotonic_and_absorbing() {
        for tier in PriorityTier::ALL {
            let down = tier.downgrade();
            if tier == PriorityTier::Background {
                assert_eq!(down, PriorityTier::Background);
            } else {
                assert!(down > tier, "{tier} should downgrade to a lower priority");
                assert_eq!(down.index(), tier.index() + 1);
            }
        }
        assert_eq!(
            PriorityTier::Background.downgrade().downgrade(),
            PriorityTier::Background
        );
    }

    #[test]
    fn capacities() {
        assert_eq!(PriorityTier::Critical.capacity(), Some(20));
        assert_eq!(PriorityTier::High.capacity(), Some(50));
        assert_eq!(PriorityTier::Normal.capacity(), Some(100));
        assert_eq!(PriorityTier::Low.capacity(), Some(200));
        assert_eq!(PriorityTier::Background.capacity(), None);
    }

    #[test]
    fn with_priority_replaces_only_priority() {
        let req = LoadingRequest::with_id("r1", ChunkCoord::new(1, 2), PriorityTier::High, 3.0);
        let down = req.clone().with_priority(PriorityTier::Normal);
        assert_eq!(down.id, "r1");
        assert_eq!(down.coord, req.coord);
        assert_eq!(down.requested_at, req.requested_at);
        assert_eq!(down.priority, PriorityTier::Normal);
        assert_eq!(req.priority, PriorityTier::High);
    }

    #[test]
    fn new_requests_get_unique_ids() {
        let a = LoadingRequest::new(ChunkCoord::new(0, 0), PriorityTier::Normal, 0.0);
        let b = LoadingRequest::new(ChunkCoord::new(0, 0), PriorityTier::Normal, 0.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("FIFO".parse::<StrategyKind>().unwrap(), StrategyKind::Fifo);
        assert_eq!("distance-based".parse::<StrategyKind>().unwrap(), StrategyKind::Distance);
        assert_eq!(" adaptive ".parse::<StrategyKind>().unwrap(), StrategyKind::Adaptive);
        assert!(matches!(
            "random".parse::<StrategyKind>(),
            Err(ChunkwiseError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn tier_serializes_snake_case() {
        let json = serde_json::to_string(&PriorityTier::Background).unwrap();
        assert_eq!(json, "\"background\"");
        let kind: StrategyKind = serde_json::from_str("\"distance\"").unwrap();
        assert_eq!(kind, StrategyKind::Distance);
    }

    #[test]
    fn outcome_from_success() {
        assert!(LoadOutcome::from_success(true).is_success());
        assert!(!LoadOutcome::from_success(false).is_success());
    }
}
