//! Configuration management for BurnKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats; the default file lives in the platform config
//! directory.
//!
//! Configuration is organized into logical sections:
//! - Machine bounds (power, speed, optimization toggles)
//! - Export options (curve tolerance, precision, start position)
//! - Logging level

pub use burnkit_core::MachineSettings;
use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use burnkit_core::constants::{COORD_PRECISION, CURVE_TOLERANCE};
use burnkit_core::Point;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest supported number of decimals for coordinates.
pub const MAX_COORDINATE_PRECISION: usize = 6;

/// Logging verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    #[default]
    Min,
    Verbose,
}

impl LogLevel {
    /// Default `tracing` filter directive for this level.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Off => "warn",
            Self::Min => "info",
            Self::Verbose => "debug",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Min => write!(f, "min"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

/// Export defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Maximum chord deviation when flattening curves (mm)
    pub curve_tolerance: f64,
    /// Decimal places for emitted coordinates
    pub coordinate_precision: usize,
    /// Optimizer start position X (mm)
    pub start_x: f64,
    /// Optimizer start position Y (mm)
    pub start_y: f64,
    /// Extension of the generated program file
    pub output_extension: String,
    /// Open the written program with the system handler
    pub autolaunch: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            curve_tolerance: CURVE_TOLERANCE,
            coordinate_precision: COORD_PRECISION,
            start_x: 0.0,
            start_y: 0.0,
            output_extension: "nc".to_string(),
            autolaunch: false,
        }
    }
}

impl ExportSettings {
    pub fn start_position(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }
}

/// Logging preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

/// On-disk format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Machine bounds
    pub machine: MachineSettings,
    /// Export defaults
    pub export: ExportSettings,
    /// Logging preferences
    pub logging: LoggingSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config_dir>/burnkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("burnkit").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("platform config directory not found".to_string())
            })
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> SettingsResult<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_from_file(&Self::default_path()?),
        }
    }

    /// Load config from file (JSON or TOML)
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SettingsError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.machine.max_power == 0 {
            return Err(invalid("machine.max_power", "must be > 0"));
        }

        if self.machine.max_speed == 0 {
            return Err(invalid("machine.max_speed", "must be > 0"));
        }

        if self.machine.travel_speed == 0 {
            return Err(invalid("machine.travel_speed", "must be > 0"));
        }

        if !(self.export.curve_tolerance > 0.0) {
            return Err(invalid("export.curve_tolerance", "must be > 0"));
        }

        if self.export.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(ConfigError::ValueOutOfRange {
                key: "export.coordinate_precision".to_string(),
                value: self.export.coordinate_precision.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.machine.max_power, 1000);
        assert_eq!(config.export.coordinate_precision, 2);
        assert_eq!(config.export.output_extension, "nc");
        assert_eq!(config.logging.level, LogLevel::Min);
        assert!(!config.export.autolaunch);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::new();
        config.machine.max_power = 255;
        config.export.start_x = 5.0;
        config.export.autolaunch = true;
        config.logging.level = LogLevel::Verbose;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.export.start_position(), Point::new(5.0, 0.0));
        assert!(loaded.export.autolaunch);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::new();
        config.machine.direction_optimization = false;
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[machine]\nmax_power = 500\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.machine.max_power, 500);
        assert_eq!(config.machine.max_speed, 6000);
        assert_eq!(config.export, ExportSettings::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Config::load_from_file(Path::new("settings.yaml"));
        assert!(matches!(
            result,
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[machine]\nmax_power = 0\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::InvalidSetting { .. })
        ));

        fs::write(&path, "[machine\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::TomlError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::new();
        config.export.curve_tolerance = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.export.coordinate_precision = 7;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));

        let mut config = Config::new();
        config.machine.travel_speed = 0;
        assert!(config.save_to_file(Path::new("unused.toml")).is_err());
    }

    #[test]
    fn test_log_level_directive() {
        assert_eq!(LogLevel::Off.directive(), "warn");
        assert_eq!(LogLevel::Min.directive(), "info");
        assert_eq!(LogLevel::Verbose.directive(), "debug");
        assert_eq!(LogLevel::Verbose.to_string(), "verbose");
    }

    #[test]
    fn test_default_path_location() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with("burnkit/config.toml"));
        }
    }
}
