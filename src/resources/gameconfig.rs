//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [physics]
//! mode = top_down
//! movement_event_threshold = 1.0
//! gravity_x = 0.0
//! gravity_y = 980.0
//! damping = 1.0
//!
//! [input]
//! gamepad_dead_zone = 0.1
//! pause_key = Escape
//!
//! [events]
//! debug_logging = false
//! ```
//!
//! Missing keys keep their defaults. A key that is present but cannot be
//! parsed is an error.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::resources::input::{Key, parse_name};

/// Default safe values for startup
const DEFAULT_MOVEMENT_EVENT_THRESHOLD: f32 = 1.0;
const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, 980.0);
const DEFAULT_DAMPING: f32 = 1.0;
const DEFAULT_GAMEPAD_DEAD_ZONE: f32 = 0.1;
const DEFAULT_PAUSE_KEY: Key = Key::Escape;
const DEFAULT_CONFIG_PATH: &str = "./framestep.ini";

/// How the physics system treats bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsMode {
    /// No gravity, no damping. Collisions never zero the other axis.
    #[default]
    TopDown,
    /// Gravity pulls bodies with mass and velocity is damped each frame.
    Platformer,
}

impl PhysicsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PhysicsMode::TopDown => "top_down",
            PhysicsMode::Platformer => "platformer",
        }
    }
}

/// Physics settings passed into each physics update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    pub mode: PhysicsMode,
    /// Minimum displacement in one frame before a movement event is queued.
    pub movement_event_threshold: f32,
    pub gravity: Vec2,
    /// Velocity multiplier applied once per frame in platformer mode, in [0, 1].
    pub damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            mode: PhysicsMode::TopDown,
            movement_event_threshold: DEFAULT_MOVEMENT_EVENT_THRESHOLD,
            gravity: DEFAULT_GRAVITY,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl PhysicsConfig {
    pub fn top_down() -> Self {
        Self::default()
    }

    pub fn platformer() -> Self {
        Self {
            mode: PhysicsMode::Platformer,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputConfig {
    /// Stick axes with a magnitude below this read as zero.
    pub gamepad_dead_zone: f32,
    /// Toggles pause/resume. Works while paused.
    pub pause_key: Key,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            gamepad_dead_zone: DEFAULT_GAMEPAD_DEAD_ZONE,
            pause_key: DEFAULT_PAUSE_KEY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventsConfig {
    /// Log every publish and queue at debug level.
    pub debug_logging: bool,
}

/// Engine configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub input: InputConfig,
    pub events: EventsConfig,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            input: InputConfig::default(),
            events: EventsConfig::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> EngineResult<()> {
        let mut ini = Ini::new();
        ini.load(&self.config_path).map_err(|e| {
            EngineError::Config(format!("failed to load {:?}: {}", self.config_path, e))
        })?;
        self.apply(&ini)?;
        info!(
            "Loaded config from {:?}: physics={}, threshold={}, pause_key={:?}",
            self.config_path,
            self.physics.mode.as_str(),
            self.physics.movement_event_threshold,
            self.input.pause_key
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> EngineResult<()> {
        let mut ini = Ini::new();
        ini.read(text.to_string()).map_err(EngineError::Config)?;
        self.apply(&ini)
    }

    fn apply(&mut self, ini: &Ini) -> EngineResult<()> {
        // [physics] section
        if let Some(mode) = ini.get("physics", "mode") {
            self.physics.mode = parse_name(mode.trim())
                .map_err(|e| EngineError::Config(format!("physics.mode: {e}")))?;
        }
        if let Some(v) = float(ini, "physics", "movement_event_threshold")? {
            self.physics.movement_event_threshold = v.max(0.0);
        }
        if let Some(v) = float(ini, "physics", "gravity_x")? {
            self.physics.gravity.x = v;
        }
        if let Some(v) = float(ini, "physics", "gravity_y")? {
            self.physics.gravity.y = v;
        }
        if let Some(v) = float(ini, "physics", "damping")? {
            self.physics.damping = v.clamp(0.0, 1.0);
        }

        // [input] section
        if let Some(v) = float(ini, "input", "gamepad_dead_zone")? {
            self.input.gamepad_dead_zone = v.clamp(0.0, 1.0);
        }
        if let Some(key) = ini.get("input", "pause_key") {
            self.input.pause_key = key
                .trim()
                .parse()
                .map_err(|e| EngineError::Config(format!("input.pause_key: {e}")))?;
        }

        // [events] section
        if let Some(v) = ini
            .getbool("events", "debug_logging")
            .map_err(|e| EngineError::Config(format!("events.debug_logging: {e}")))?
        {
            self.events.debug_logging = v;
        }
        Ok(())
    }

    fn to_ini(&self) -> Ini {
        let mut config = Ini::new();

        // [physics] section
        let p = &self.physics;
        config.set("physics", "mode", Some(p.mode.as_str().to_string()));
        config.set(
            "physics",
            "movement_event_threshold",
            Some(p.movement_event_threshold.to_string()),
        );
        config.set("physics", "gravity_x", Some(p.gravity.x.to_string()));
        config.set("physics", "gravity_y", Some(p.gravity.y.to_string()));
        config.set("physics", "damping", Some(p.damping.to_string()));

        // [input] section
        config.set(
            "input",
            "gamepad_dead_zone",
            Some(self.input.gamepad_dead_zone.to_string()),
        );
        config.set("input", "pause_key", Some(format!("{:?}", self.input.pause_key)));

        // [events] section
        config.set(
            "events",
            "debug_logging",
            Some(self.events.debug_logging.to_string()),
        );
        config
    }

    /// Render the configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        self.to_ini().writes()
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> EngineResult<()> {
        self.to_ini().write(&self.config_path).map_err(|e| {
            EngineError::Config(format!("failed to save {:?}: {}", self.config_path, e))
        })?;
        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}

fn float(ini: &Ini, section: &str, key: &str) -> EngineResult<Option<f32>> {
    ini.getfloat(section, key)
        .map(|v| v.map(|f| f as f32))
        .map_err(|e| EngineError::Config(format!("{section}.{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::new();
        assert_eq!(cfg.physics.mode, PhysicsMode::TopDown);
        assert_eq!(cfg.physics.movement_event_threshold, 1.0);
        assert_eq!(cfg.input.pause_key, Key::Escape);
        assert!(!cfg.events.debug_logging);
    }

    #[test]
    fn test_load_overrides_present_keys_only() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str("[physics]\nmode = platformer\ngravity_y = 500\n\n[input]\npause_key = P\n")
            .unwrap();
        assert_eq!(cfg.physics.mode, PhysicsMode::Platformer);
        assert_eq!(cfg.physics.gravity, Vec2::new(0.0, 500.0));
        assert_eq!(cfg.physics.damping, 1.0);
        assert_eq!(cfg.input.pause_key, Key::P);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let mut cfg = EngineConfig::new();
        let err = cfg
            .load_from_str("[physics]\ndamping = lots\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("damping")));

        let err = cfg.load_from_str("[physics]\nmode = sideways\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_damping_is_clamped() {
        let mut cfg = EngineConfig::new();
        cfg.load_from_str("[physics]\ndamping = 3.5\n").unwrap();
        assert_eq!(cfg.physics.damping, 1.0);
    }

    #[test]
    fn test_ini_text_roundtrip() {
        let mut cfg = EngineConfig::new();
        cfg.physics.mode = PhysicsMode::Platformer;
        cfg.input.pause_key = Key::F1;
        cfg.events.debug_logging = true;

        let mut loaded = EngineConfig::new();
        loaded.load_from_str(&cfg.to_ini_string()).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut cfg = EngineConfig::with_path("/nonexistent/framestep.ini");
        assert!(matches!(cfg.load_from_file(), Err(EngineError::Config(_))));
    }
}
