//! Error handling for BurnKit core types
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Errors raised while building or (de)serializing core model values.
#[derive(Error, Debug)]
pub enum Error {
    /// A segment was constructed without any points.
    #[error("Path segment must contain at least one point")]
    EmptySegment,

    /// A per-point power list does not line up with the segment points.
    #[error("Power list has {powers} entries but segment has {points} points")]
    PowerListMismatch {
        /// Number of points in the segment.
        points: usize,
        /// Number of power values supplied.
        powers: usize,
    },

    /// A model parameter is outside its valid domain.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from any message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Create an invalid-parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
