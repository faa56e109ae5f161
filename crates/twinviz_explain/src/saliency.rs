//! Gradient saliency for twin models.
//!
//! The pipeline runs in four steps, each exposed on its own:
//!
//! 1. [`input_gradients`]: gradient of the first prediction with respect to
//!    both (unbatched) input images.
//! 2. [`saliency_weights`]: channel-averaged absolute gradients, summed over
//!    the two images.
//! 3. [`SaliencyMap::normalize`]: divide by the global maximum.
//! 4. [`render_overlay`]: colour-map the saliency and blend it onto `image1`.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use image::{GrayImage, RgbImage};
use ndarray::ArrayView3;
use serde::{Deserialize, Serialize};
use twinviz_core::{tensor_to_array, to_rgb8, BaseNormalization, CoreError, ImageShape, TwinModel};

use crate::blend::add_weighted;
use crate::colormap::Colormap;
use crate::error::{ExplainError, Result};

/// What to do when every saliency weight is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlatSaliency {
    /// Return an all-zero map (logged as a warning).
    #[default]
    Zeros,
    /// Fail with [`ExplainError::FlatSaliency`].
    Fail,
}

/// Configuration for saliency overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaliencyConfig {
    /// Weight of the base image in the blend.
    pub image_weight: f64,
    /// Weight of the heatmap in the blend.
    pub heatmap_weight: f64,
    /// Constant added to every blended channel.
    pub offset: f64,
    /// Colormap for the heatmap.
    pub colormap: Colormap,
    /// How `image1` is mapped to 8 bits.
    pub base: BaseNormalization,
    /// Policy for all-zero saliency.
    pub flat: FlatSaliency,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            image_weight: 0.6,
            heatmap_weight: 0.4,
            offset: 0.0,
            colormap: Colormap::Jet,
            base: BaseNormalization::SelfMax,
            flat: FlatSaliency::Zeros,
        }
    }
}

impl SaliencyConfig {
    /// Set the blend weights for base image and heatmap.
    #[must_use]
    pub fn with_weights(mut self, image_weight: f64, heatmap_weight: f64) -> Self {
        self.image_weight = image_weight;
        self.heatmap_weight = heatmap_weight;
        self
    }

    /// Set the colormap.
    #[must_use]
    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    /// Set the base image normalization.
    #[must_use]
    pub fn with_base(mut self, base: BaseNormalization) -> Self {
        self.base = base;
        self
    }

    /// Set the flat saliency policy.
    #[must_use]
    pub fn with_flat(mut self, flat: FlatSaliency) -> Self {
        self.flat = flat;
        self
    }
}

/// Gradients of the first prediction with respect to each input image.
///
/// Both tensors have the shape of the corresponding unbatched input `(H, W, C)`.
#[derive(Debug, Clone)]
pub struct InputGradients<B: Backend> {
    /// Gradient with respect to `image1`.
    pub image1: Tensor<B, 3>,
    /// Gradient with respect to `image2`.
    pub image2: Tensor<B, 3>,
}

/// Compute input gradients for one image pair.
///
/// Both images are detached and marked as gradient sources, then batched to
/// `(1, H, W, C)` inside the recorded graph. The model output's row 0 is the
/// prediction; if it has several entries they are summed before the backward
/// pass. Gradients are read on the unbatched sources, so they come back as
/// `(H, W, C)`. A source the prediction does not depend on gets a zero
/// gradient.
///
/// # Errors
///
/// Returns an error if the model output is empty or a gradient comes back in
/// an unexpected shape.
pub fn input_gradients<B, M>(
    model: &M,
    image1: Tensor<B, 3>,
    image2: Tensor<B, 3>,
) -> Result<InputGradients<B::InnerBackend>>
where
    B: AutodiffBackend,
    M: TwinModel<B>,
{
    let dims1 = image1.dims();
    let dims2 = image2.dims();

    let image1 = image1.detach().require_grad();
    let image2 = image2.detach().require_grad();

    let outputs = model.forward(
        image1.clone().unsqueeze_dim::<4>(0),
        image2.clone().unsqueeze_dim::<4>(0),
    );
    let [batch, n_outputs] = outputs.dims();
    if batch == 0 || n_outputs == 0 {
        return Err(ExplainError::EmptyPrediction([batch, n_outputs]));
    }
    tracing::debug!("model output {:?}, attributing row 0", [batch, n_outputs]);

    let predictions = outputs.slice([0..1, 0..n_outputs]).sum();
    let grads = predictions.backward();

    Ok(InputGradients {
        image1: source_gradient(&image1, &grads, dims1)?,
        image2: source_gradient(&image2, &grads, dims2)?,
    })
}

fn source_gradient<B: AutodiffBackend>(
    source: &Tensor<B, 3>,
    grads: &B::Gradients,
    expected: [usize; 3],
) -> Result<Tensor<B::InnerBackend, 3>> {
    match source.grad(grads) {
        Some(grad) => {
            if grad.dims() != expected {
                return Err(CoreError::ShapeMismatch(format!(
                    "gradient {:?} for input {:?}",
                    grad.dims(),
                    expected
                ))
                .into());
            }
            Ok(grad)
        }
        None => Ok(source.clone().inner().zeros_like()),
    }
}

/// Single-channel `(H, W)` saliency map.
#[derive(Debug, Clone)]
pub struct SaliencyMap<B: Backend> {
    /// The saliency values.
    pub values: Tensor<B, 2>,
}

impl<B: Backend> SaliencyMap<B> {
    /// Wrap raw values.
    pub fn new(values: Tensor<B, 2>) -> Self {
        Self { values }
    }

    /// `[H, W]`.
    pub fn dims(&self) -> [usize; 2] {
        self.values.dims()
    }

    /// Largest value in the map.
    pub fn max(&self) -> f32 {
        self.values.clone().max().into_scalar().elem()
    }

    /// Divide by the global maximum so the largest value becomes exactly 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::FlatSaliency`] for an all-zero map under
    /// [`FlatSaliency::Fail`], and [`ExplainError::NonFiniteSaliency`] when
    /// the maximum is NaN or infinite.
    pub fn normalize(&self, flat: FlatSaliency) -> Result<Self> {
        let max = self.max();
        if !max.is_finite() {
            return Err(ExplainError::NonFiniteSaliency(max));
        }
        if max <= 0.0 {
            return match flat {
                FlatSaliency::Zeros => {
                    tracing::warn!("saliency map is flat, returning all-zero map");
                    Ok(Self::new(self.values.clone().zeros_like()))
                }
                FlatSaliency::Fail => Err(ExplainError::FlatSaliency),
            };
        }
        tracing::debug!("normalizing saliency by max {max}");
        Ok(Self::new(self.values.clone() / max))
    }

    /// Values in row-major order.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        self.values
            .clone()
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| CoreError::Conversion(format!("{:?}", e)).into())
    }

    /// `u8(255 * v)` per pixel, truncated and saturated.
    pub fn to_gray8(&self) -> Result<GrayImage> {
        let [height, width] = self.dims();
        let bytes: Vec<u8> = self
            .to_vec()?
            .into_iter()
            .map(|v| (255.0 * v) as u8)
            .collect();
        GrayImage::from_raw(width as u32, height as u32, bytes).ok_or_else(|| {
            CoreError::Conversion(format!("{}x{} saliency buffer", height, width)).into()
        })
    }

    /// False-colour heatmap of the map.
    pub fn to_heatmap(&self, colormap: Colormap) -> Result<RgbImage> {
        Ok(colormap.apply(&self.to_gray8()?))
    }
}

/// Reduce a gradient pair to raw saliency weights.
///
/// `weights[h, w] = mean_c |g1[h, w, c]| + mean_c |g2[h, w, c]|`
///
/// # Errors
///
/// Returns an error if the two gradients differ in height or width.
pub fn saliency_weights<B: Backend>(grads: &InputGradients<B>) -> Result<SaliencyMap<B>> {
    let shape1 = ImageShape::from_dims(&grads.image1.dims())?;
    let shape2 = ImageShape::from_dims(&grads.image2.dims())?;
    shape1.ensure_same_spatial(&shape2)?;

    let [height, width] = [shape1.height(), shape1.width()];
    let channel_mean = |g: Tensor<B, 3>| g.abs().mean_dim(2).reshape([height, width]);

    let weights = channel_mean(grads.image1.clone()) + channel_mean(grads.image2.clone());
    Ok(SaliencyMap::new(weights))
}

/// Blend a normalized saliency map onto `image1`.
///
/// `image1` is rendered to 8 bits with `config.base`, the map is colour-mapped
/// with `config.colormap`, and the two are combined with [`add_weighted`].
///
/// # Errors
///
/// Returns an error if the map and the image differ in height or width, or
/// the image has an unsupported channel count.
pub fn render_overlay<B: Backend>(
    image1: ArrayView3<'_, f32>,
    saliency: &SaliencyMap<B>,
    config: &SaliencyConfig,
) -> Result<RgbImage> {
    let image_shape = ImageShape::from_dims(image1.shape())?;
    let [height, width] = saliency.dims();
    image_shape.ensure_same_spatial(&ImageShape::new(height, width, 1))?;

    let heatmap = saliency.to_heatmap(config.colormap)?;
    let base = to_rgb8(image1, config.base)?;
    add_weighted(
        &base,
        config.image_weight,
        &heatmap,
        config.heatmap_weight,
        config.offset,
    )
}

/// Every intermediate of one saliency computation.
#[derive(Debug, Clone)]
pub struct SaliencyExplanation<B: Backend> {
    /// Channel-averaged absolute gradients before normalization.
    pub weights: SaliencyMap<B>,
    /// Normalized map in `[0, 1]`.
    pub saliency: SaliencyMap<B>,
    /// Colour-mapped saliency.
    pub heatmap: RgbImage,
    /// Heatmap blended onto `image1`.
    pub overlay: RgbImage,
}

/// Run the whole pipeline and keep every intermediate.
pub fn explain_pair<B, M>(
    model: &M,
    image1: Tensor<B, 3>,
    image2: Tensor<B, 3>,
    config: &SaliencyConfig,
) -> Result<SaliencyExplanation<B::InnerBackend>>
where
    B: AutodiffBackend,
    M: TwinModel<B>,
{
    let base = tensor_to_array(image1.clone().inner())?;
    tracing::debug!("explaining pair with image1 {:?}", base.dim());

    let grads = input_gradients(model, image1, image2)?;
    let weights = saliency_weights(&grads)?;
    let saliency = weights.normalize(config.flat)?;
    let heatmap = saliency.to_heatmap(config.colormap)?;
    let overlay = render_overlay(base.view(), &saliency, config)?;

    Ok(SaliencyExplanation {
        weights,
        saliency,
        heatmap,
        overlay,
    })
}

/// Saliency overlay for one image pair.
///
/// Computes the gradient of the model's first prediction with respect to
/// `image1` and `image2`, reduces it to a per-pixel map, normalizes it,
/// applies the colormap, and blends the heatmap onto `image1`.
///
/// Nothing is written or displayed; the caller decides where the overlay goes.
///
/// # Arguments
///
/// * `model` - Differentiable twin model
/// * `image1` - First image `(H, W, C)`, the one the overlay is drawn on
/// * `image2` - Second image `(H, W, C)`
/// * `config` - Blend weights, colormap and normalization policies
///
/// # Returns
///
/// An `H x W` RGB image.
pub fn generate_saliency_map<B, M>(
    model: &M,
    image1: Tensor<B, 3>,
    image2: Tensor<B, 3>,
    config: &SaliencyConfig,
) -> Result<RgbImage>
where
    B: AutodiffBackend,
    M: TwinModel<B>,
{
    Ok(explain_pair(model, image1, image2, config)?.overlay)
}
