//! Configuration file support.
//!
//! Settings are stored as versioned JSON under the platform config directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_HISTORY, DEFAULT_STROKE_RADIUS, DEFAULT_WL_SENSITIVITY, MAX_STROKE_RADIUS,
    MIN_STROKE_RADIUS, ZOOM_STEP,
};
use crate::intensity::{DefaultVoi, VoiPreset, default_presets};
use crate::keybindings::KeyBindings;
use crate::model::{PathologyClass, Taxonomy, default_classes};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// All log levels from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewer preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Window used when an image suggests none
    #[serde(default)]
    pub default_voi: DefaultVoi,

    /// Initial brush radius in image pixels
    #[serde(default = "default_stroke_radius")]
    pub stroke_radius: f64,

    /// Scale factor per zoom step
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    /// Window/level change per dragged screen pixel
    #[serde(default = "default_wl_sensitivity")]
    pub wl_sensitivity: f64,

    /// Depth of the redo history
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_stroke_radius() -> f64 {
    DEFAULT_STROKE_RADIUS
}

fn default_zoom_step() -> f64 {
    ZOOM_STEP
}

fn default_wl_sensitivity() -> f64 {
    DEFAULT_WL_SENSITIVITY
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            default_voi: DefaultVoi::default(),
            stroke_radius: default_stroke_radius(),
            zoom_step: default_zoom_step(),
            wl_sensitivity: default_wl_sensitivity(),
            max_history: default_max_history(),
        }
    }
}

impl Preferences {
    /// Replace out-of-range values with usable ones.
    fn sanitize(&mut self) {
        if !self.stroke_radius.is_finite() {
            log::warn!("Invalid stroke radius in config, using default");
            self.stroke_radius = DEFAULT_STROKE_RADIUS;
        }
        self.stroke_radius = self.stroke_radius.clamp(MIN_STROKE_RADIUS, MAX_STROKE_RADIUS);

        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            log::warn!("Zoom step {} must be > 1, using default", self.zoom_step);
            self.zoom_step = ZOOM_STEP;
        }
        if !self.wl_sensitivity.is_finite() || self.wl_sensitivity <= 0.0 {
            log::warn!("Window/level sensitivity {} must be > 0", self.wl_sensitivity);
            self.wl_sensitivity = DEFAULT_WL_SENSITIVITY;
        }
    }
}

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub preferences: Preferences,

    #[serde(default)]
    pub keybindings: KeyBindings,

    #[serde(default = "default_presets")]
    pub presets: Vec<VoiPreset>,

    /// Classes used when the host provides no ontology
    #[serde(default = "default_classes")]
    pub classes: Vec<PathologyClass>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            keybindings: KeyBindings::default(),
            presets: default_presets(),
            classes: default_classes(),
        }
    }

    /// Taxonomy built from the configured classes.
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::new(self.classes.clone())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a configuration, rejecting files from a newer format version.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.preferences.sanitize();
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "neocxr-config.json"
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path. `None` on WASM (no filesystem access).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("neocxr").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("neocxr")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::Voi;
    use crate::keybindings::{Action, Key, KeyChord};

    #[test]
    fn test_default_round_trip() {
        let config = AppConfig::default();
        let json = config.to_json().unwrap();
        let back = AppConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.taxonomy().len(), default_classes().len());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.preferences, Preferences::default());
        assert_eq!(config.presets.len(), 5);
        assert_eq!(
            config.keybindings.action_for(KeyChord::ctrl(Key::S)),
            Some(Action::SaveDraft)
        );
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AppConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_preferences_are_sanitized() {
        let json = r#"{"version": 1, "preferences": {
            "log_level": "debug",
            "stroke_radius": 55.0,
            "zoom_step": 0.5,
            "wl_sensitivity": -2.0,
            "default_voi": {"mode": "sample_range"}
        }}"#;
        let prefs = AppConfig::from_json(json).unwrap().preferences;
        assert_eq!(prefs.log_level, LogLevel::Debug);
        assert_eq!(prefs.stroke_radius, MAX_STROKE_RADIUS);
        assert_eq!(prefs.zoom_step, ZOOM_STEP);
        assert_eq!(prefs.wl_sensitivity, DEFAULT_WL_SENSITIVITY);
        assert_eq!(prefs.default_voi, DefaultVoi::SampleRange);
    }

    #[test]
    fn test_fixed_default_voi_json() {
        let json = r#"{"version": 1, "preferences": {
            "default_voi": {"mode": "fixed", "voi": {"window_width": 400, "window_center": 40}}
        }}"#;
        let prefs = AppConfig::from_json(json).unwrap().preferences;
        assert_eq!(
            prefs.default_voi,
            DefaultVoi::Fixed {
                voi: Voi::new(400.0, 40.0)
            }
        );
    }

    #[test]
    fn test_save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(AppConfig::default_filename());

        let mut config = AppConfig::default();
        config.preferences.max_history = 7;
        config.save_to_path(&path).unwrap();

        let loaded = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.preferences.max_history, 7);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::all().len(), 5);
    }
}
