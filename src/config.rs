//! Configuration management for mapsearch using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmConfig;
use crate::models::{Coordinate, ViewportState, ZoomRange};

/// File name of the saved places store inside the data directory.
pub const SAVED_PLACES_FILENAME: &str = "saved_places.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Map behavior: zoom limits, fit policy and the initial view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    /// Fitting a result set never zooms in past this level.
    #[serde(default = "default_fit_max_zoom")]
    pub fit_max_zoom: u8,
    #[serde(default = "default_fit_padding_px")]
    pub fit_padding_px: u32,
    /// Assumed size of the map canvas in pixels.
    #[serde(default = "default_viewport_width_px")]
    pub viewport_width_px: u32,
    #[serde(default = "default_viewport_height_px")]
    pub viewport_height_px: u32,
    #[serde(default = "default_fly_duration_ms")]
    pub fly_duration_ms: u64,
    #[serde(default = "default_center")]
    pub default_center: Coordinate,
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
    /// Zoom used when focusing a single place or the user's location.
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,
    /// Home location: `"lat,lng"` or a known city name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

fn default_min_zoom() -> u8 {
    3
}

fn default_max_zoom() -> u8 {
    18
}

fn default_fit_max_zoom() -> u8 {
    15
}

fn default_fit_padding_px() -> u32 {
    50
}

fn default_viewport_width_px() -> u32 {
    1024
}

fn default_viewport_height_px() -> u32 {
    768
}

fn default_fly_duration_ms() -> u64 {
    1500
}

fn default_center() -> Coordinate {
    Coordinate::from_validated(40.7128, -74.0060)
}

fn default_zoom() -> u8 {
    12
}

fn default_focus_zoom() -> u8 {
    15
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            fit_max_zoom: default_fit_max_zoom(),
            fit_padding_px: default_fit_padding_px(),
            viewport_width_px: default_viewport_width_px(),
            viewport_height_px: default_viewport_height_px(),
            fly_duration_ms: default_fly_duration_ms(),
            default_center: default_center(),
            default_zoom: default_zoom(),
            focus_zoom: default_focus_zoom(),
            home: None,
        }
    }
}

impl MapConfig {
    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange::new(self.min_zoom, self.max_zoom)
    }

    /// The view shown before any search.
    pub fn initial_viewport(&self) -> ViewportState {
        self.zoom_range()
            .viewport(self.default_center, self.default_zoom as i32)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Search backend configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub map: MapConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers mapsearch config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("mapsearch").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load from an explicit path if given, otherwise discover.
    pub async fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::load().await),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Effective data directory.
    pub fn data_dir(&self) -> PathBuf {
        match self.data_dir {
            Some(ref data_dir) => {
                let base = self.base_dir().unwrap_or_else(|| {
                    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
                });
                self.resolve_path(data_dir, &base)
            }
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mapsearch"),
        }
    }

    pub fn saved_places_path(&self) -> PathBuf {
        self.data_dir().join(SAVED_PLACES_FILENAME)
    }

    /// Effective configuration rendered as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
