//! # twinviz_core
//!
//! Core types and traits for twinviz.
//!
//! This crate provides:
//! - [`TwinModel`] and [`RankingModel`], the capabilities the utilities consume
//! - [`ImageShape`] for `(H, W, C)` image metadata
//! - [`ImagePairs`], a labelled set of paired images
//! - Conversions between host arrays, Burn tensors and 8-bit RGB images
//! - Error types and common utilities
//!
//! ## Layout Convention
//!
//! Images are channels-last:
//! - single image: `(H, W, C)`
//! - batch of images: `(N, H, W, C)`
//!
//! Pixel values are in whatever range the application uses; nothing here
//! assumes `[0, 1]` or `[0, 255]` until an image is rendered to 8 bits.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod imaging;
mod model_trait;
mod pairs;
mod shape;

pub use error::{CoreError, Result};
pub use imaging::{
    array_to_tensor, batch_to_tensor, load_rgb_array, tensor_to_array, to_rgb8, BaseNormalization,
};
pub use model_trait::{RankingModel, TwinModel};
pub use pairs::{stack_images, ImagePairs};
pub use shape::ImageShape;

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;

    #[cfg(feature = "backend-ndarray")]
    pub use burn_autodiff::Autodiff;
}
