//! Configuration management for the charter drawing engine.
//!
//! Loads configuration from TOML files: hit-testing tolerances, magnet
//! snapping, and where persisted drawings live.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drawing: DrawingConfig,
    pub magnet: MagnetConfig,
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations.
    ///
    /// Searches in order:
    /// 1. `./config.toml`
    /// 2. `~/.config/charter/config.toml`
    ///
    /// Returns default config if no file found.
    pub fn load_default() -> Self {
        if let Ok(config) = Self::load(Self::default_path()) {
            return config;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("charter").join("config.toml");
            if let Ok(config) = Self::load(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.toml")
    }
}

/// Interaction tolerances for drawings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Distance in pixels within which a pointer hits a drawing's outline.
    pub hit_threshold_px: f64,
    /// Radius in pixels of the grab area around each control point.
    pub control_point_radius_px: f64,
    /// Number of samples used to approximate curved outlines when hit-testing.
    pub arc_samples: usize,
    /// Default standard-deviation multiplier for regression channels.
    pub regression_deviation: f64,
    /// Drawings whose anchors all lie within this many pixels of the first
    /// one are discarded on completion. Zero disables the check.
    pub min_drawing_size_px: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            hit_threshold_px: 6.0,
            control_point_radius_px: 8.0,
            arc_samples: 20,
            regression_deviation: 2.0,
            min_drawing_size_px: 0.0,
        }
    }
}

/// Snapping strength applied to pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnetMode {
    #[default]
    None,
    /// Snap to the nearest OHLC value only when the pointer is close to it.
    Weak,
    /// Always snap to the nearest bar's closest OHLC value.
    Strong,
}

/// Magnet snapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagnetConfig {
    /// Mode active at startup.
    pub mode: MagnetMode,
    /// Maximum pixel distance between pointer and OHLC value for weak snapping.
    pub weak_tolerance_px: f64,
}

impl Default for MagnetConfig {
    fn default() -> Self {
        Self {
            mode: MagnetMode::None,
            weak_tolerance_px: 12.0,
        }
    }
}

/// Where persisted drawings are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Directory holding one JSON file per symbol.
    /// Defaults to ~/.local/share/charter/drawings
    pub dir: Option<PathBuf>,
}

impl PersistenceConfig {
    /// Get the drawings directory, falling back to the platform data dir.
    pub fn drawings_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("charter")
                .join("drawings")
        })
    }
}
