//! # twinviz_explain
//!
//! Explainability tools for twin (two-input) image models.
//!
//! This crate provides:
//! - Input-gradient saliency for both images of a pair
//! - Saliency normalization with an explicit policy for flat maps
//! - False-colour mapping ([`Colormap`]) and weighted blending ([`add_weighted`])
//! - [`generate_saliency_map`], the full gradient-to-overlay pipeline
//!
//! ## Example
//!
//! ```rust,ignore
//! use twinviz_explain::{generate_saliency_map, SaliencyConfig};
//!
//! let overlay = generate_saliency_map(&model, image1, image2, &SaliencyConfig::default())?;
//! overlay.save("saliency.png")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod blend;
mod colormap;
mod error;
mod saliency;

pub use blend::add_weighted;
pub use colormap::Colormap;
pub use error::{ExplainError, Result};
pub use saliency::{
    explain_pair, generate_saliency_map, input_gradients, render_overlay, saliency_weights,
    FlatSaliency, InputGradients, SaliencyConfig, SaliencyExplanation, SaliencyMap,
};
