//! Model traits consumed by the explain and analysis utilities.
//!
//! A model is anything that maps batched channels-last images to a `(N, K)`
//! prediction tensor. Plain structs and Burn modules alike implement these.

use burn::prelude::*;

/// A two-input ("twin") model scoring a pair of images.
///
/// Gradient-based explanations require `B` to be an autodiff backend and the
/// forward pass to be differentiable with respect to both inputs.
pub trait TwinModel<B: Backend> {
    /// Forward pass on a batch of image pairs.
    ///
    /// # Arguments
    ///
    /// * `image1` - First images of each pair, shape `(N, H, W, C)`
    /// * `image2` - Second images of each pair, shape `(N, H, W, C)`
    ///
    /// # Returns
    ///
    /// Predictions of shape `(N, K)`. Row `i` belongs to pair `i`; column 0
    /// is the score reported by the visualisation utilities.
    fn forward(&self, image1: Tensor<B, 4>, image2: Tensor<B, 4>) -> Tensor<B, 2>;
}

/// A single-input model assigning a ranking score to each image.
pub trait RankingModel<B: Backend> {
    /// Score a batch of images.
    ///
    /// # Arguments
    ///
    /// * `images` - Images of shape `(N, H, W, C)`
    ///
    /// # Returns
    ///
    /// Scores of shape `(N, K)`; column 0 is used for ranking.
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

impl<B: Backend, M: TwinModel<B>> TwinModel<B> for &M {
    fn forward(&self, image1: Tensor<B, 4>, image2: Tensor<B, 4>) -> Tensor<B, 2> {
        (**self).forward(image1, image2)
    }
}

impl<B: Backend, M: RankingModel<B>> RankingModel<B> for &M {
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        (**self).score(images)
    }
}
