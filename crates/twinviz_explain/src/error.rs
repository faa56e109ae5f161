//! Error types for explanations.

use thiserror::Error;

/// Result type alias for explain operations.
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Errors that can occur while computing or rendering an explanation.
#[derive(Error, Debug)]
pub enum ExplainError {
    /// Every saliency weight is zero, so the map cannot be normalized.
    #[error("Saliency map is flat: every attribution weight is zero")]
    FlatSaliency,

    /// The saliency maximum is NaN or infinite.
    #[error("Saliency map contains non-finite values (max = {0})")]
    NonFiniteSaliency(f32),

    /// The model returned no prediction to attribute.
    #[error("Model returned an empty prediction of shape {0:?}")]
    EmptyPrediction([usize; 2]),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] twinviz_core::CoreError),
}
