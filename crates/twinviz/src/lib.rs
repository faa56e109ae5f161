//! # twinviz
//!
//! Saliency overlays, evaluation and plotting for twin (pairwise ranking)
//! image models.
//!
//! - **Core**: model traits, image/array conversion, pair sets
//! - **Explain**: input-gradient saliency blended onto the input image
//! - **Analysis**: test accuracy, training curves, prediction and ranking grids
//! - **Models**: a reference [`TwinRanker`](models::TwinRanker) with checkpoints
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use twinviz::prelude::*;
//! use twinviz::core::backend::{Autodiff, NdArray};
//!
//! type B = Autodiff<NdArray>;
//! let device = Default::default();
//!
//! let model = TwinRankerConfig::new(ImageShape::new(64, 64, 3)).init::<B>(&device);
//! let image1 = array_to_tensor::<B>(load_rgb_array("a.png")?.view(), &device);
//! let image2 = array_to_tensor::<B>(load_rgb_array("b.png")?.view(), &device);
//!
//! let overlay = generate_saliency_map(&model, image1, image2, &SaliencyConfig::default())?;
//! overlay.save("saliency.png")?;
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend using ndarray

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub use twinviz_analysis as analysis;
pub use twinviz_core as core;
pub use twinviz_explain as explain;
pub use twinviz_models as models;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use twinviz::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use twinviz_core::{
        array_to_tensor, load_rgb_array, stack_images, BaseNormalization, ImagePairs, ImageShape,
        RankingModel, TwinModel,
    };

    // Explain
    pub use twinviz_explain::{
        explain_pair, generate_saliency_map, Colormap, FlatSaliency, SaliencyConfig,
    };

    // Analysis
    pub use twinviz_analysis::{
        evaluate_pairs, plot_accuracy, plot_loss, plot_pair_predictions, plot_ranking_predict,
        EvaluationConfig, PredictionGridConfig, RankingGridConfig, TrainingHistory,
    };

    // Models
    pub use twinviz_models::{TwinRanker, TwinRankerConfig};
}
