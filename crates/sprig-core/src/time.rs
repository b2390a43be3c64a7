//! Time resource for Sprig
//!
//! Holds the raw frame delta reported by the host, the fixed simulation step,
//! and a clamped time scale applied to both.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration for simulation time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Initial multiplier applied to every delta
    pub time_scale: f32,
    /// Lower bound enforced on every time scale write
    pub min_time_scale: f32,
    /// Upper bound enforced on every time scale write
    pub max_time_scale: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            min_time_scale: 0.01,
            max_time_scale: 5.0,
        }
    }
}

impl TimeConfig {
    /// Whether `[min_time_scale, max_time_scale]` is a usable, non-empty range
    pub fn has_valid_range(&self) -> bool {
        self.min_time_scale > 0.0
            && self.min_time_scale <= self.max_time_scale
            && self.max_time_scale.is_finite()
    }
}

/// Shared simulation time, registered as a world resource.
///
/// `delta()` and `fixed_delta()` are the values handed to updatable
/// components; both are scaled by `time_scale()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeResource {
    time_scale: f32,
    min_time_scale: f32,
    max_time_scale: f32,
    fixed_step: f32,
    raw_delta: f32,
}

impl Default for TimeResource {
    fn default() -> Self {
        Self::new(&TimeConfig::default(), 1.0 / 60.0)
    }
}

impl TimeResource {
    /// Create a time resource from config with the given fixed step in seconds.
    /// An unusable scale range falls back to the default range.
    pub fn new(config: &TimeConfig, fixed_step: f32) -> Self {
        let range = if config.has_valid_range() {
            config.clone()
        } else {
            TimeConfig::default()
        };
        let mut time = Self {
            time_scale: 1.0,
            min_time_scale: range.min_time_scale,
            max_time_scale: range.max_time_scale,
            fixed_step,
            raw_delta: 0.0,
        };
        time.set_time_scale(config.time_scale);
        time
    }

    /// Current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the time scale, clamped to the configured range. NaN is ignored.
    pub fn set_time_scale(&mut self, scale: f32) {
        if scale.is_nan() {
            return;
        }
        self.time_scale = scale.clamp(self.min_time_scale, self.max_time_scale);
    }

    /// Add `amount` to the time scale, clamped to the configured range
    pub fn adjust_time_scale(&mut self, amount: f32) {
        self.set_time_scale(self.time_scale + amount);
    }

    /// Unscaled fixed step in seconds
    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    pub fn set_fixed_step(&mut self, seconds: f32) {
        self.fixed_step = seconds;
    }

    /// Unscaled delta of the last frame
    pub fn raw_delta(&self) -> f32 {
        self.raw_delta
    }

    pub fn set_raw_delta(&mut self, seconds: f32) {
        self.raw_delta = seconds;
    }

    /// Scaled variable delta
    pub fn delta(&self) -> f32 {
        self.raw_delta * self.time_scale
    }

    /// Scaled fixed delta
    pub fn fixed_delta(&self) -> f32 {
        self.fixed_step * self.time_scale
    }
}

impl fmt::Display for TimeResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scale: {:.3}, Fixed: {:.3}ms, Delta: {:.3}ms",
            self.time_scale,
            self.fixed_step * 1000.0,
            self.raw_delta * 1000.0
        )
    }
}
