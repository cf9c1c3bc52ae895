//! Error types for the toolpath pipeline.
//!
//! Shape-level and image-level failures are recoverable: the exporter logs
//! them and skips the offending unit. Only I/O on the final output is fatal.

use std::io;
use thiserror::Error;

/// Errors that can occur while building toolpaths or emitting G-code.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// A shape could not be turned into geometry.
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// SVG path data could not be read.
    #[error("Path data error: {0}")]
    PathData(#[from] PathDataError),

    /// A raster image could not be decoded or resampled.
    #[error("Image processing error: {0}")]
    Image(String),

    /// A raster job references an image that does not exist.
    #[error("Missing image source: {0}")]
    MissingImageSource(String),

    /// An emitter operation was called out of order.
    #[error("Emitter is {found}, expected {expected}")]
    InvalidEmitterState {
        expected: &'static str,
        found: &'static str,
    },

    /// G-code generation failed.
    #[error("G-code generation failed: {0}")]
    GenerationFailed(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A core model error occurred.
    #[error(transparent)]
    Core(#[from] burnkit_core::Error),
}

impl From<image::ImageError> for CamToolError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Errors related to pipeline parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Dimensions are invalid (zero or negative).
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Errors raised while reading SVG path data.
#[derive(Error, Debug, PartialEq)]
pub enum PathDataError {
    /// A token that is neither a command nor a number.
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken { position: usize, token: String },

    /// A command ran out of numeric arguments.
    #[error("Command '{command}' expects {expected} arguments")]
    MissingArguments { command: char, expected: usize },

    /// Numbers appeared before any command.
    #[error("Path data must start with a moveto command")]
    MissingMoveTo,

    /// An arc flag was not `0` or `1`.
    #[error("Invalid arc flag '{0}'")]
    InvalidArcFlag(String),
}

/// Result type alias for pipeline operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

/// Result type alias for path data parsing.
pub type PathDataResult<T> = Result<T, PathDataError>;
