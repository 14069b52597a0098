use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ChunkwiseError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

/// Parse a profiled env var. Unparseable values are logged and treated as unset.
fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str) -> Option<T> {
    let raw = profiled_env_opt(profile, key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub scheduler: SchedulerEnvConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &[
    "MAX_CONCURRENT_LOADS",
    "LOAD_STRATEGY",
    "TILE_WIDTH",
];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CHUNKWISE_PROFILE` env var. When set (e.g. `SERVER`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CHUNKWISE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            scheduler: SchedulerEnvConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let s = &self.scheduler;
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  scheduler:   max_concurrent_loads={}, strategy={}",
            opt_label(&s.max_concurrent_loads),
            s.strategy.as_deref().unwrap_or("(default)")
        );
        tracing::info!(
            "  world:       tile_width={}",
            opt_label(&s.tile_width)
        );
        tracing::info!(
            "  maintenance: cleanup_interval_secs={}, rebalance_interval_secs={}",
            opt_label(&s.cleanup_interval_secs),
            opt_label(&s.rebalance_interval_secs)
        );
    }

    /// Return the env-derived settings as JSON (used by status output).
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "scheduler": self.scheduler,
        })
    }
}

fn opt_label<T: std::fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(default)".to_string())
}

// ── Scheduler ─────────────────────────────────────────────────

/// Scheduler settings taken from the environment.
///
/// Every field is optional: unset values leave the scheduler's compiled
/// defaults (or a TOML file's values) untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerEnvConfig {
    pub max_concurrent_loads: Option<usize>,
    /// "fifo", "priority", "distance", "adaptive"
    pub strategy: Option<String>,
    pub tile_width: Option<f64>,
    pub cleanup_interval_secs: Option<u64>,
    pub rebalance_interval_secs: Option<u64>,
}

impl SchedulerEnvConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_concurrent_loads: profiled_env_parse(p, "MAX_CONCURRENT_LOADS"),
            strategy: profiled_env_opt(p, "LOAD_STRATEGY").map(|s| s.trim().to_lowercase()),
            tile_width: profiled_env_parse(p, "TILE_WIDTH"),
            cleanup_interval_secs: profiled_env_parse(p, "CLEANUP_INTERVAL_SECS"),
            rebalance_interval_secs: profiled_env_parse(p, "REBALANCE_INTERVAL_SECS"),
        }
    }

    /// Reject values the scheduler cannot use.
    pub fn validate(&self) -> Result<(), ChunkwiseError> {
        if self.max_concurrent_loads == Some(0) {
            return Err(ChunkwiseError::InvalidValue {
                key: "MAX_CONCURRENT_LOADS".into(),
                value: "0".into(),
            });
        }
        if let Some(w) = self.tile_width {
            if !w.is_finite() || w <= 0.0 {
                return Err(ChunkwiseError::InvalidValue {
                    key: "TILE_WIDTH".into(),
                    value: w.to_string(),
                });
            }
        }
        Ok(())
    }
}
