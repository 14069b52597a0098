//! Priority-based chunk loading scheduler with tiered backpressure.
//!
//! Producers admit [`LoadingRequest`]s with
//! [`ChunkScheduler::schedule_load`]; the active [`StrategyKind`] decides the
//! effective [`PriorityTier`], and a saturated tier pushes the request one
//! tier down instead of rejecting it. Loader workers pull work with
//! [`ChunkScheduler::get_next_task`] under a global concurrency ceiling and
//! report back with [`ChunkScheduler::report_completion`]. Cancellation is
//! advisory: queued requests are filtered out at dispatch time.

pub mod background;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queues;
pub mod runner;
pub mod sources;
pub mod strategy;
pub mod types;

mod state;

pub use background::{spawn_cleanup_task, spawn_rebalance_task, BackgroundJobs};
pub use config::{SchedulerConfig, SchedulerConfigUpdate};
pub use error::{QueueError, SchedulerError};
pub use metrics::{LoadMetrics, QueueStatistics};
pub use runner::ChunkScheduler;
pub use sources::{Clock, ManualClock, NoPressure, PressureSource, SharedPressure, SystemClock};
pub use strategy::{effective_priority, tier_for_distance, DISTANCE_TIER_THRESHOLDS};
pub use types::{FailedLoad, LoadOutcome, LoadingRequest, PriorityTier, StrategyKind};

pub use chunkwise_core::{ChunkCoord, RequestId};
