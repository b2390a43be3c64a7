use serde::{Deserialize, Serialize};
use sprig_core::TimeConfig;

/// Errors raised when a [`WorldConfig`] cannot be used to build a world.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("world capacity must be at least one entity")]
    ZeroCapacity,

    #[error("world capacity {0} exceeds the largest addressable slot")]
    CapacityTooLarge(usize),

    #[error("fixed update rate must be at least 1 step per second")]
    ZeroFixedRate,

    #[error("invalid time scale range [{min}, {max}]")]
    InvalidTimeScaleRange { min: f32, max: f32 },
}

/// Construction parameters for a [`World`](crate::World).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of entity slots allocated up front
    pub max_entities: usize,
    /// Whether updaters run in fixed steps instead of once per frame
    pub fixed_update: bool,
    /// Fixed steps per second
    pub fixed_fps: u32,
    /// Time scale settings for the time resource
    pub time: TimeConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: 10_000,
            fixed_update: false,
            fixed_fps: 60,
            time: TimeConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Default config with the given capacity
    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            max_entities,
            ..Default::default()
        }
    }

    /// Fixed step length in seconds
    pub fn fixed_step(&self) -> f64 {
        1.0 / f64::from(self.fixed_fps.max(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entities == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_entities > i32::MAX as usize {
            return Err(ConfigError::CapacityTooLarge(self.max_entities));
        }
        if self.fixed_fps == 0 {
            return Err(ConfigError::ZeroFixedRate);
        }
        if !self.time.has_valid_range() {
            return Err(ConfigError::InvalidTimeScaleRange {
                min: self.time.min_time_scale,
                max: self.time.max_time_scale,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = WorldConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert!((config.fixed_step() - 1.0 / 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            WorldConfig::with_capacity(0).validate(),
            Err(ConfigError::ZeroCapacity)
        );

        let config = WorldConfig {
            fixed_fps: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroFixedRate));

        let mut config = WorldConfig::default();
        config.time.min_time_scale = 2.0;
        config.time.max_time_scale = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeScaleRange { .. })
        ));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: WorldConfig = toml::from_str(
            r#"
            max_entities = 64
            fixed_update = true

            [time]
            max_time_scale = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.max_entities, 64);
        assert!(config.fixed_update);
        assert_eq!(config.fixed_fps, 60);
        assert_eq!(config.time.max_time_scale, 3.0);
        assert_eq!(config.time.min_time_scale, 0.01);
    }
}
