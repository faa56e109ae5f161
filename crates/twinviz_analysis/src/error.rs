//! Error types for analysis and plotting.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during evaluation or rendering.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A required history series is absent.
    #[error("History has no series named '{0}'")]
    MissingSeries(String),

    /// Evaluation needs labels but the pair set has none.
    #[error("Evaluation requires labels")]
    MissingLabels,

    /// Invalid batch size.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// The model returned no score column.
    #[error("Model returned no outputs for {0} inputs")]
    EmptyOutput(usize),

    /// Number of scores does not match the number of images.
    #[error("Got {scores} scores for {images} images")]
    ScoreCount {
        /// Number of scores.
        scores: usize,
        /// Number of images.
        images: usize,
    },

    /// A ranked entry points past the end of the image batch.
    #[error("Image index {index} out of range for {len} images")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of images.
        len: usize,
    },

    /// Tensor data could not be read back.
    #[error("Tensor conversion error: {0}")]
    Conversion(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] twinviz_core::CoreError),
}
