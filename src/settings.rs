//! Demo settings with persistence
//!
//! Settings are read from `~/.config/sprig/demo.toml` unless a path is given.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sprig_ecs::WorldConfig;
use tracing::{info, warn};

/// All demo settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub world: WorldConfig,
    pub demo: DemoOptions,
}

impl DemoSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sprig"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("demo.toml"))
    }

    /// Load settings from `path`, or the default location when `None`.
    /// Falls back to defaults if the file is missing or unreadable.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(path) = Self::settings_path() else {
                    warn!("Could not determine config directory");
                    return Self::default();
                };
                path
            }
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let path = dir.join("demo.toml");
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// How entities are driven each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoMode {
    /// Movers update themselves through the update hook
    #[default]
    Components,
    /// Same as `Components`, with fixed-step updates
    Fixed,
    /// Plain data moved by host passes built on queries
    Query,
}

impl DemoMode {
    pub fn name(&self) -> &'static str {
        match self {
            DemoMode::Components => "components",
            DemoMode::Fixed => "fixed",
            DemoMode::Query => "query",
        }
    }
}

/// Simulation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoOptions {
    pub mode: DemoMode,
    /// Number of frames to simulate before exiting
    pub frames: u32,
    /// Nominal frame rate of the simulated clock
    pub frame_rate: f32,
    /// Relative frame time jitter (0.0 to 1.0)
    pub frame_jitter: f32,
    /// Seed for spawning and clock jitter
    pub seed: u64,
    /// Entities spawned at startup
    pub initial_entities: usize,
    /// Entities spawned per frame while spawning
    pub spawn_per_frame: usize,
    /// Frames spent spawning, then despawning, alternately
    pub wave_frames: u32,
    /// Playfield width in pixels
    pub width: f32,
    /// Playfield height in pixels
    pub height: f32,
    /// Chance (0 to 100) for a new entity to pulse
    pub pulse_chance: u32,
    /// Chance (0 to 100) for a pulsing entity to be frozen as inert
    pub inert_chance: u32,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            mode: DemoMode::Components,
            frames: 600,
            frame_rate: 60.0,
            frame_jitter: 0.25,
            seed: 0x5eed,
            initial_entities: 100,
            spawn_per_frame: 10,
            wave_frames: 120,
            width: 1280.0,
            height: 720.0,
            pulse_chance: 5,
            inert_chance: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = DemoSettings::parse("").unwrap();
        assert_eq!(settings.demo.mode, DemoMode::Components);
        assert_eq!(settings.world.max_entities, 10_000);
    }

    #[test]
    fn partial_sections() {
        let settings = DemoSettings::parse(
            r#"
            [world]
            max_entities = 500
            fixed_update = true

            [world.time]
            time_scale = 2.0

            [demo]
            mode = "query"
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(settings.world.max_entities, 500);
        assert!(settings.world.fixed_update);
        assert_eq!(settings.world.time.time_scale, 2.0);
        assert_eq!(settings.demo.mode, DemoMode::Query);
        assert_eq!(settings.demo.seed, 7);
        assert_eq!(settings.demo.frames, 600);
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(DemoSettings::parse("[demo]\nmode = \"turbo\"").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings = DemoSettings::load(Some(Path::new("/nonexistent/sprig/demo.toml")));
        assert_eq!(settings.demo.frames, DemoOptions::default().frames);
    }

    #[test]
    fn round_trip_through_toml() {
        let mut settings = DemoSettings::default();
        settings.demo.mode = DemoMode::Fixed;
        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(DemoSettings::parse(&text).unwrap().demo.mode, DemoMode::Fixed);
    }
}
