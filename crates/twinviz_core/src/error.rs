//! Error types for twinviz_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in twinviz_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid array or tensor shape provided.
    #[error("Invalid shape: expected {expected}, got {got}")]
    InvalidShape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Shape mismatch between two arrays that must agree.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Unsupported number of colour channels.
    #[error("Unsupported channel count {0}: expected 1 or 3")]
    UnsupportedChannels(usize),

    /// Invalid value range for normalization.
    #[error("Invalid range: min {min} must be below max {max}")]
    InvalidRange {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// Tensor data could not be read back to the host.
    #[error("Tensor conversion error: {0}")]
    Conversion(String),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Image(#[from] ::image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
