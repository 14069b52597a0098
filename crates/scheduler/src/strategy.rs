//! Effective-priority resolution for each [`StrategyKind`].
//!
//! Everything here is a pure function of the request, the current
//! pressure reading and the configuration.

use crate::config::SchedulerConfig;
use crate::types::{LoadingRequest, PriorityTier, StrategyKind};

/// Upper bounds (exclusive, in tile widths) for Critical, High, Normal and Low.
/// Anything at or beyond the last bound is Background.
pub const DISTANCE_TIER_THRESHOLDS: [f64; 4] = [2.0, 6.0, 10.0, 16.0];

/// Resolve the tier a request should be admitted into.
pub fn effective_priority(
    kind: StrategyKind,
    request: &LoadingRequest,
    pressure: Option<f64>,
    config: &SchedulerConfig,
) -> PriorityTier {
    match kind {
        StrategyKind::Fifo | StrategyKind::Priority => request.priority,
        StrategyKind::Distance => tier_for_distance(request.distance, config.tile_width),
        StrategyKind::Adaptive => adaptive_priority(request.priority, pressure, config),
    }
}

/// Discretize a world-space distance into a tier.
pub fn tier_for_distance(distance: f64, tile_width: f64) -> PriorityTier {
    // NaN and negative distances count as "on top of the player".
    let tiles = if distance.is_nan() || distance <= 0.0 {
        0.0
    } else {
        distance / tile_width
    };

    DISTANCE_TIER_THRESHOLDS
        .iter()
        .zip(PriorityTier::ALL)
        .find(|(bound, _)| tiles < **bound)
        .map(|(_, tier)| tier)
        .unwrap_or(PriorityTier::Background)
}

/// Caller priority, one tier lower when pressure is above the high-water mark.
pub fn adaptive_priority(
    requested: PriorityTier,
    pressure: Option<f64>,
    config: &SchedulerConfig,
) -> PriorityTier {
    match pressure {
        Some(p) if p > config.high_pressure => requested.downgrade(),
        _ => requested,
    }
}

/// Whether pressure warrants evicting the low and background tiers.
pub fn should_shed(pressure: Option<f64>, config: &SchedulerConfig) -> bool {
    matches!(pressure, Some(p) if p > config.critical_pressure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::ChunkCoord;

    fn request(priority: PriorityTier, distance: f64) -> LoadingRequest {
        LoadingRequest::with_id("r", ChunkCoord::new(0, 0), priority, distance)
    }

    #[test]
    fn passthrough_strategies_keep_caller_priority() {
        let config = SchedulerConfig::default();
        let req = request(PriorityTier::Low, 0.0);
        for kind in [StrategyKind::Fifo, StrategyKind::Priority] {
            assert_eq!(effective_priority(kind, &req, Some(1.0), &config), PriorityTier::Low);
        }
    }

    #[test]
    fn distance_thresholds() {
        let w = 16.0;
        assert_eq!(tier_for_distance(0.0, w), PriorityTier::Critical);
        assert_eq!(tier_for_distance(1.9 * w, w), PriorityTier::Critical);
        assert_eq!(tier_for_distance(2.0 * w, w), PriorityTier::High);
        assert_eq!(tier_for_distance(5.0 * w, w), PriorityTier::High);
        assert_eq!(tier_for_distance(6.0 * w, w), PriorityTier::Normal);
        assert_eq!(tier_for_distance(12.0 * w, w), PriorityTier::Low);
        assert_eq!(tier_for_distance(16.0 * w, w), PriorityTier::Background);
        assert_eq!(tier_for_distance(f64::INFINITY, w), PriorityTier::Background);
        assert_eq!(tier_for_distance(-4.0, w), PriorityTier::Critical);
        assert_eq!(tier_for_distance(f64::NAN, w), PriorityTier::Critical);
    }

    #[test]
    fn distance_strategy_ignores_caller_priority() {
        let config = SchedulerConfig::default();
        let req = request(PriorityTier::Background, 5.0 * config.tile_width);
        assert_eq!(
            effective_priority(StrategyKind::Distance, &req, None, &config),
            PriorityTier::High
        );
    }

    #[test]
    fn adaptive_downgrades_above_high_water_mark() {
        let config = SchedulerConfig::default();
        let req = request(PriorityTier::High, 0.0);
        assert_eq!(
            effective_priority(StrategyKind::Adaptive, &req, Some(0.85), &config),
            PriorityTier::Normal
        );
        assert_eq!(
            effective_priority(StrategyKind::Adaptive, &req, Some(0.8), &config),
            PriorityTier::High
        );
        assert_eq!(
            effective_priority(StrategyKind::Adaptive, &req, None, &config),
            PriorityTier::High
        );
    }

    #[test]
    fn adaptive_background_stays_background() {
        let config = SchedulerConfig::default();
        assert_eq!(
            adaptive_priority(PriorityTier::Background, Some(1.0), &config),
            PriorityTier::Background
        );
    }

    #[test]
    fn shed_only_above_critical_mark() {
        let config = SchedulerConfig::default();
        assert!(!should_shed(None, &config));
        assert!(!should_shed(Some(0.9), &config));
        assert!(should_shed(Some(0.95), &config));
    }
}
