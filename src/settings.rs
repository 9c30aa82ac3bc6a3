//! Game settings
//!
//! Read once at startup from a JSON file. Every field has a default so a
//! partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::SPAWN_INTERVAL;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Window / arena ===
    /// Window width in pixels (also the arena width)
    pub width: u32,
    /// Window height in pixels (also the arena height)
    pub height: u32,

    // === Simulation ===
    /// RNG seed for initial velocities and spawn positions
    pub seed: u64,
    /// Balls created at startup
    pub initial_balls: u32,
    /// Ticks between dynamic spawns
    pub spawn_interval: u32,
    /// Spawns are skipped once this many balls exist
    pub max_balls: u32,

    // === Assets ===
    /// Directory holding `graphics.png` and `shaders/`
    pub asset_dir: PathBuf,

    // === Debug ===
    /// Draw collision contact markers
    pub debug_markers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,

            seed: 0x5EED,
            initial_balls: 8,
            spawn_interval: SPAWN_INTERVAL,
            max_balls: 64,

            asset_dir: PathBuf::from("assets"),

            debug_markers: false,
        }
    }
}

impl Settings {
    /// Default settings file name, looked up in the working directory
    pub const FILE_NAME: &'static str = "ballpit.json";

    /// Environment variable overriding the settings path
    pub const PATH_ENV: &'static str = "BALLPIT_SETTINGS";

    /// Smallest accepted window dimension
    const MIN_DIMENSION: u32 = 64;

    /// Load settings from `$BALLPIT_SETTINGS` or `ballpit.json`.
    ///
    /// A missing file yields defaults; a malformed one is reported and
    /// replaced by defaults.
    pub fn load() -> Self {
        let path = std::env::var_os(Self::PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Clamp values that would make the simulation meaningless
    pub fn validated(mut self) -> Self {
        self.width = self.width.max(Self::MIN_DIMENSION);
        self.height = self.height.max(Self::MIN_DIMENSION);
        self.spawn_interval = self.spawn_interval.max(1);
        self.max_balls = self.max_balls.max(self.initial_balls);
        self
    }

    pub fn atlas_path(&self) -> PathBuf {
        self.asset_dir.join("graphics.png")
    }

    pub fn vertex_shader_path(&self) -> PathBuf {
        self.asset_dir.join("shaders").join("sprite.vert.wgsl")
    }

    pub fn fragment_shader_path(&self) -> PathBuf {
        self.asset_dir.join("shaders").join("sprite.frag.wgsl")
    }
}
