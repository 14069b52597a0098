//! Chunk scheduler runner -- the public operations over the shared state.
//!
//! Split into focused submodules:
//! - `core`: ChunkScheduler struct, constructors, configuration and read-only views
//! - `admission`: `schedule_load` with downgrade-on-saturation
//! - `dispatch`: `get_next_task` with the concurrency ceiling and cancelled-entry skipping
//! - `completion`: `report_completion` and latency accounting
//! - `cancellation`: advisory `cancel_request`
//! - `maintenance`: cancellation-marker cleanup and adaptive load shedding

mod admission;
mod cancellation;
mod completion;
mod core;
mod dispatch;
mod maintenance;

pub use self::core::ChunkScheduler;
