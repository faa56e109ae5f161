//! # twinviz_analysis
//!
//! Analysis and reporting utilities for twin image models.
//!
//! This crate provides:
//! - Test-set evaluation (loss and accuracy) for twin models
//! - [`TrainingHistory`] loaded from Keras-style history JSON
//! - Loss and accuracy curves rendered to PNG
//! - Prediction grids (pair, pair, score) and ranking grids
//!
//! Every renderer is split into a pure `render_*` function returning an
//! image and a `plot_*` function that writes it to a caller-supplied path.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canvas;
pub mod curves;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod inference;
pub mod predictions;
pub mod ranking;

pub use curves::{accuracy_plot, loss_plot, plot_accuracy, plot_loss, CurvePlot, PlotStyle, Series};
pub use error::{AnalysisError, Result};
pub use evaluation::{binary_cross_entropy, evaluate_pairs, EvaluationConfig, EvaluationResult};
pub use history::TrainingHistory;
pub use inference::{predict_images, predict_pairs, scores_path};
pub use predictions::{plot_pair_predictions, render_prediction_grid, PredictionGridConfig};
pub use ranking::{
    plot_ranking_predict, rank_images, rank_scores, render_ranking_grid, RankedImage,
    RankingGridConfig,
};
