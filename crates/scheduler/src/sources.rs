//! External collaborators consumed by the scheduler: a clock and a
//! resource-pressure gauge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Time source for request timestamps and load latency.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Current system resource pressure in `0.0..=1.0`.
///
/// `None` means the monitor is unavailable; the adaptive strategy then
/// falls back to the caller-supplied priority.
pub trait PressureSource: Send + Sync {
    fn pressure(&self) -> Option<f64>;
}

/// Pressure source that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPressure;

impl PressureSource for NoPressure {
    fn pressure(&self) -> Option<f64> {
        None
    }
}

/// Pressure gauge updated by an external monitor. Clones share the value.
#[derive(Debug, Clone)]
pub struct SharedPressure {
    bits: Arc<AtomicU64>,
}

impl SharedPressure {
    /// Starts out unavailable.
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(f64::NAN.to_bits())),
        }
    }

    pub fn with_value(value: f64) -> Self {
        let gauge = Self::new();
        gauge.set(value);
        gauge
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Mark the monitor as unavailable.
    pub fn clear(&self) {
        self.bits.store(f64::NAN.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedPressure {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureSource for SharedPressure {
    fn pressure(&self) -> Option<f64> {
        let value = f64::from_bits(self.bits.load(Ordering::Relaxed));
        value.is_finite().then(|| value.clamp(0.0, 1.0))
    }
}
