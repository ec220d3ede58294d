//! Engine configuration.
//!
//! Provides the tunable parameters of a session: default grid size, tick
//! cadence, win-check cadence, headless run length and the log filter.
//! Configuration is read from a TOML file; a missing or broken file falls
//! back to the defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "mathmachine.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Grid Settings ===
    /// Width of a blank level in cells
    pub default_width: u32,
    /// Height of a blank level in cells
    pub default_height: u32,

    // === Simulation Settings ===
    /// Rendered frames per simulation tick
    pub frames_per_tick: u32,
    /// Ticks between two win-condition checks
    pub win_check_interval: u32,
    /// Frames a headless run lasts unless overridden
    pub max_frames: u64,

    // === Debug Settings ===
    /// Default tracing filter directive (`RUST_LOG` takes precedence)
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Grid
            default_width: 16,
            default_height: 16,

            // Simulation
            frames_per_tick: 4,
            win_check_interval: 30,
            max_frames: 10_000,

            // Debug
            log_filter: "mathmachine=info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Config file not found, using defaults");
                return Self::default();
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                info!("Loaded config from {}", path.display());
                config.validate();
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        match dirs_config_path() {
            Some(config_dir) => config_dir.join("mathmachine").join(CONFIG_FILE),
            // Fall back to current directory
            None => PathBuf::from(CONFIG_FILE),
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Grid
        self.default_width = self.default_width.clamp(1, 4096);
        self.default_height = self.default_height.clamp(1, 4096);

        // Simulation
        self.frames_per_tick = self.frames_per_tick.clamp(1, 600);
        self.win_check_interval = self.win_check_interval.clamp(1, 10_000);
        self.max_frames = self.max_frames.max(1);

        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
    }
}

/// Get platform-specific config directory.
fn dirs_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return std::env::var_os("APPDATA").map(PathBuf::from);
    }
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}
