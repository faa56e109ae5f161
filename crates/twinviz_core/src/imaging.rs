//! Conversions between host arrays, Burn tensors and 8-bit RGB images.

use std::path::Path;

use ::image::{Rgb, RgbImage};
use burn::prelude::*;
use ndarray::{Array3, ArrayView3, ArrayView4};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::shape::ImageShape;

/// How a float image is mapped to `[0, 255]` before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum BaseNormalization {
    /// Divide by the image's own maximum, then scale by 255.
    ///
    /// Contrast therefore depends on the image content: two images from the
    /// same data range can render with different brightness. An all-zero
    /// image renders black.
    #[default]
    SelfMax,
    /// Map a known data range `[min, max]` linearly onto `[0, 255]`.
    Range {
        /// Value rendered as 0.
        min: f32,
        /// Value rendered as 255.
        max: f32,
    },
}

impl BaseNormalization {
    /// Build the per-element mapping `v -> v'` in `[0, 1]` for the given image.
    fn scaler(&self, values: ArrayView3<'_, f32>) -> Result<impl Fn(f32) -> f32> {
        let (offset, divisor) = match *self {
            BaseNormalization::SelfMax => {
                let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                if max == 0.0 || !max.is_finite() {
                    tracing::debug!("image maximum is {max}, rendering as black");
                    (0.0, 0.0)
                } else {
                    (0.0, max)
                }
            }
            BaseNormalization::Range { min, max } => {
                if min.is_nan() || max.is_nan() || min >= max {
                    return Err(CoreError::InvalidRange { min, max });
                }
                (min, max - min)
            }
        };
        Ok(move |v: f32| {
            if divisor == 0.0 {
                0.0
            } else {
                (v - offset) / divisor
            }
        })
    }
}

/// Render a channels-last float image as an 8-bit RGB image.
///
/// Each value is normalized, multiplied by 255, truncated toward zero and
/// saturated to `[0, 255]`. Single-channel images are replicated to gray RGB.
///
/// # Errors
///
/// Returns an error for channel counts other than 1 or 3, or an invalid
/// normalization range.
pub fn to_rgb8(image: ArrayView3<'_, f32>, normalization: BaseNormalization) -> Result<RgbImage> {
    let shape = ImageShape::from_dims(image.shape())?;
    let channels = shape.channels();
    if channels != 1 && channels != 3 {
        return Err(CoreError::UnsupportedChannels(channels));
    }

    let scale = normalization.scaler(image.view())?;
    let to_u8 = |v: f32| (255.0 * scale(v)) as u8;

    let mut out = RgbImage::new(shape.width() as u32, shape.height() as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (row, col) = (y as usize, x as usize);
        *pixel = if channels == 1 {
            let v = to_u8(image[[row, col, 0]]);
            Rgb([v, v, v])
        } else {
            Rgb([
                to_u8(image[[row, col, 0]]),
                to_u8(image[[row, col, 1]]),
                to_u8(image[[row, col, 2]]),
            ])
        };
    }
    Ok(out)
}

/// Copy a single `(H, W, C)` image into a Burn tensor.
pub fn array_to_tensor<B: Backend>(image: ArrayView3<'_, f32>, device: &B::Device) -> Tensor<B, 3> {
    let dims = image.dim();
    let data: Vec<f32> = image.iter().copied().collect();
    Tensor::from_data(TensorData::new(data, [dims.0, dims.1, dims.2]), device)
}

/// Copy a batch of `(N, H, W, C)` images into a Burn tensor.
pub fn batch_to_tensor<B: Backend>(batch: ArrayView4<'_, f32>, device: &B::Device) -> Tensor<B, 4> {
    let dims = batch.dim();
    let data: Vec<f32> = batch.iter().copied().collect();
    Tensor::from_data(TensorData::new(data, [dims.0, dims.1, dims.2, dims.3]), device)
}

/// Read a `(H, W, C)` tensor back into a host array.
pub fn tensor_to_array<B: Backend>(tensor: Tensor<B, 3>) -> Result<Array3<f32>> {
    let [h, w, c] = tensor.dims();
    let data: Vec<f32> = tensor
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| CoreError::Conversion(format!("{:?}", e)))?;
    Array3::from_shape_vec((h, w, c), data).map_err(|e| CoreError::Conversion(e.to_string()))
}

/// Load an image file as an `(H, W, 3)` array with values in `[0, 255]`.
pub fn load_rgb_array(path: impl AsRef<Path>) -> Result<Array3<f32>> {
    let path = path.as_ref();
    let rgb = ::image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    tracing::debug!("loaded {} ({}x{})", path.display(), width, height);

    let data: Vec<f32> = rgb.into_raw().into_iter().map(f32::from).collect();
    Array3::from_shape_vec((height as usize, width as usize, 3), data)
        .map_err(|e| CoreError::Conversion(e.to_string()))
}
