use std::path::Path;
use std::time::Duration;

use chunkwise_core::config::SchedulerEnvConfig;
use chunkwise_core::ChunkwiseError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::StrategyKind;

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Global ceiling on in-progress loads. Must be positive.
    #[serde(default = "default_max_concurrent_loads")]
    pub max_concurrent_loads: usize,
    /// Strategy used to resolve effective priority at admission.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// World units per chunk; distance thresholds are expressed in tile widths.
    #[serde(default = "default_tile_width")]
    pub tile_width: f64,
    /// Cleanup job interval in seconds.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    /// Adaptive rebalance interval in seconds.
    #[serde(default = "default_rebalance_interval")]
    pub rebalance_interval_secs: u64,
    /// Pressure above which the adaptive strategy downgrades admissions.
    #[serde(default = "default_high_pressure")]
    pub high_pressure: f64,
    /// Pressure above which rebalance evicts the low and background tiers.
    #[serde(default = "default_critical_pressure")]
    pub critical_pressure: f64,
    /// Consecutive cancelled entries a single dispatch may discard.
    #[serde(default = "default_max_dispatch_skips")]
    pub max_dispatch_skips: usize,
}

fn default_max_concurrent_loads() -> usize { 4 }
fn default_tile_width() -> f64 { 16.0 }
fn default_cleanup_interval() -> u64 { 60 }
fn default_rebalance_interval() -> u64 { 5 }
fn default_high_pressure() -> f64 { 0.8 }
fn default_critical_pressure() -> f64 { 0.9 }
fn default_max_dispatch_skips() -> usize { 10 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: default_max_concurrent_loads(),
            strategy: StrategyKind::default(),
            tile_width: default_tile_width(),
            cleanup_interval_secs: default_cleanup_interval(),
            rebalance_interval_secs: default_rebalance_interval(),
            high_pressure: default_high_pressure(),
            critical_pressure: default_critical_pressure(),
            max_dispatch_skips: default_max_dispatch_skips(),
        }
    }
}

/// Partial configuration for [`crate::ChunkScheduler::update_configuration`].
/// `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfigUpdate {
    #[serde(default)]
    pub max_concurrent_loads: Option<usize>,
    #[serde(default)]
    pub strategy: Option<StrategyKind>,
    #[serde(default)]
    pub tile_width: Option<f64>,
    #[serde(default)]
    pub high_pressure: Option<f64>,
    #[serde(default)]
    pub critical_pressure: Option<f64>,
}

impl SchedulerConfig {
    /// Parse a TOML document. Missing keys take their defaults; values the
    /// scheduler cannot run with are an error.
    pub fn from_toml_str(raw: &str) -> Result<Self, ChunkwiseError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ChunkwiseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject a zero ceiling, a non-positive or non-finite tile width and
    /// pressure marks outside `0..=1`.
    pub fn validate(&self) -> Result<(), ChunkwiseError> {
        let invalid = |key: &str, value: String| ChunkwiseError::InvalidValue {
            key: key.to_string(),
            value,
        };

        if self.max_concurrent_loads == 0 {
            return Err(invalid("max_concurrent_loads", "0".into()));
        }
        if !(self.tile_width.is_finite() && self.tile_width > 0.0) {
            return Err(invalid("tile_width", self.tile_width.to_string()));
        }
        if !(0.0..=1.0).contains(&self.high_pressure) {
            return Err(invalid("high_pressure", self.high_pressure.to_string()));
        }
        if !(0.0..=1.0).contains(&self.critical_pressure) {
            return Err(invalid("critical_pressure", self.critical_pressure.to_string()));
        }
        Ok(())
    }

    /// Replace each invalid field with its default, logging a warning per
    /// rejected value. Valid fields pass through unchanged.
    pub fn sanitized(self) -> Self {
        let update = SchedulerConfigUpdate {
            max_concurrent_loads: Some(self.max_concurrent_loads),
            strategy: None,
            tile_width: Some(self.tile_width),
            high_pressure: Some(self.high_pressure),
            critical_pressure: Some(self.critical_pressure),
        };
        let mut config = Self {
            max_concurrent_loads: default_max_concurrent_loads(),
            tile_width: default_tile_width(),
            high_pressure: default_high_pressure(),
            critical_pressure: default_critical_pressure(),
            ..self
        };
        config.apply_update(update);
        config
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ChunkwiseError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }

    pub fn rebalance_interval(&self) -> Duration {
        Duration::from_secs(self.rebalance_interval_secs.max(1))
    }

    /// Overlay environment settings. Invalid values are logged and skipped.
    pub fn apply_env(&mut self, env: &SchedulerEnvConfig) {
        let strategy = env.strategy.as_deref().and_then(|s| match s.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                warn!("Ignoring LOAD_STRATEGY: {}", e);
                None
            }
        });

        self.apply_update(SchedulerConfigUpdate {
            max_concurrent_loads: env.max_concurrent_loads,
            strategy,
            tile_width: env.tile_width,
            ..Default::default()
        });

        if let Some(secs) = env.cleanup_interval_secs {
            self.cleanup_interval_secs = secs;
        }
        if let Some(secs) = env.rebalance_interval_secs {
            self.rebalance_interval_secs = secs;
        }
    }

    /// Merge a partial update. Invalid fields are rejected individually.
    pub fn apply_update(&mut self, update: SchedulerConfigUpdate) {
        if let Some(max) = update.max_concurrent_loads {
            if max == 0 {
                warn!("Rejected max_concurrent_loads=0, keeping {}", self.max_concurrent_loads);
            } else {
                self.max_concurrent_loads = max;
            }
        }

        if let Some(strategy) = update.strategy {
            self.strategy = strategy;
        }

        if let Some(width) = update.tile_width {
            if width.is_finite() && width > 0.0 {
                self.tile_width = width;
            } else {
                warn!("Rejected tile_width={}, keeping {}", width, self.tile_width);
            }
        }

        if let Some(high) = update.high_pressure {
            if (0.0..=1.0).contains(&high) {
                self.high_pressure = high;
            } else {
                warn!("Rejected high_pressure={}, keeping {}", high, self.high_pressure);
            }
        }

        if let Some(critical) = update.critical_pressure {
            if (0.0..=1.0).contains(&critical) {
                self.critical_pressure = critical;
            } else {
                warn!(
                    "Rejected critical_pressure={}, keeping {}",
                    critical, self.critical_pressure
                );
            }
        }
    }
}
