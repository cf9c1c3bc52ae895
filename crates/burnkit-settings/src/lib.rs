//! BurnKit Settings Crate
//!
//! Handles application configuration: machine bounds, export options and
//! the logging level, stored as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{Config, ConfigFormat, ExportSettings, LogLevel, LoggingSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
