//! Batched inference returning one score per input.

use std::path::{Path, PathBuf};

use burn::prelude::*;
use ndarray::{s, ArrayView4};
use serde::Serialize;
use twinviz_core::{batch_to_tensor, ImagePairs, RankingModel, TwinModel};

use crate::error::{AnalysisError, Result};

/// Column 0 of a `(N, K)` output as host floats.
pub(crate) fn first_column<B: Backend>(outputs: Tensor<B, 2>) -> Result<Vec<f32>> {
    let [n, k] = outputs.dims();
    if k == 0 {
        return Err(AnalysisError::EmptyOutput(n));
    }
    outputs
        .slice([0..n, 0..1])
        .reshape([n])
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| AnalysisError::Conversion(format!("{:?}", e)))
}

/// Score the first `limit` pairs (all pairs when `None`) in batches.
///
/// # Returns
///
/// Column 0 of the model output for each pair, in order.
pub fn predict_pairs<B, M>(
    model: &M,
    pairs: &ImagePairs,
    limit: Option<usize>,
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<f32>>
where
    B: Backend,
    M: TwinModel<B>,
{
    if batch_size == 0 {
        return Err(AnalysisError::InvalidBatchSize(batch_size));
    }
    let n = limit.map_or(pairs.len(), |l| l.min(pairs.len()));

    let mut scores = Vec::with_capacity(n);
    for start in (0..n).step_by(batch_size) {
        let end = (start + batch_size).min(n);
        let (left, right) = pairs.batch_tensors::<B>(start..end, device);
        scores.extend(first_column(model.forward(left, right))?);
    }
    tracing::debug!("scored {} pairs", scores.len());
    Ok(scores)
}

/// Score every image of an `(N, H, W, C)` batch in batches.
pub fn predict_images<B, M>(
    model: &M,
    images: ArrayView4<'_, f32>,
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<f32>>
where
    B: Backend,
    M: RankingModel<B>,
{
    if batch_size == 0 {
        return Err(AnalysisError::InvalidBatchSize(batch_size));
    }
    let n = images.shape()[0];

    let mut scores = Vec::with_capacity(n);
    for start in (0..n).step_by(batch_size) {
        let end = (start + batch_size).min(n);
        let batch = batch_to_tensor::<B>(images.slice(s![start..end, .., .., ..]), device);
        scores.extend(first_column(model.score(batch))?);
    }
    tracing::debug!("scored {} images", scores.len());
    Ok(scores)
}

/// Path of the JSON scores file written next to a rendered grid.
pub fn scores_path(image_path: impl AsRef<Path>) -> PathBuf {
    image_path.as_ref().with_extension("json")
}

/// Write `scores` as pretty JSON next to `image_path`.
pub(crate) fn save_scores<T: Serialize + ?Sized>(image_path: &Path, scores: &T) -> Result<PathBuf> {
    let path = scores_path(image_path);
    std::fs::write(&path, serde_json::to_string_pretty(scores)?)?;
    tracing::debug!("wrote scores to {}", path.display());
    Ok(path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::Array4;
    use twinviz_core::backend::NdArray;

    /// Mean of image1 minus mean of image2, plus a second constant column.
    pub(crate) struct MeanGap;

    impl<B: Backend> TwinModel<B> for MeanGap {
        fn forward(&self, image1: Tensor<B, 4>, image2: Tensor<B, 4>) -> Tensor<B, 2> {
            let [n, h, w, c] = image1.dims();
            let a = image1.reshape([n, h * w * c]).mean_dim(1);
            let b = image2.reshape([n, h * w * c]).mean_dim(1);
            let extra = a.clone().zeros_like() + 7.0;
            Tensor::cat(vec![a - b, extra], 1)
        }
    }

    impl<B: Backend> RankingModel<B> for MeanGap {
        fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
            let [n, h, w, c] = images.dims();
            images.reshape([n, h * w * c]).mean_dim(1)
        }
    }

    /// Pairs whose left image is filled with `i` and right with 0.
    pub(crate) fn indexed_pairs(n: usize) -> ImagePairs {
        let left = Array4::from_shape_fn((n, 2, 2, 3), |(i, _, _, _)| i as f32);
        let right = Array4::zeros((n, 2, 2, 3));
        ImagePairs::new(left, right).unwrap()
    }

    #[test]
    fn test_predict_pairs_batches_in_order() {
        let pairs = indexed_pairs(7);
        let device = Default::default();
        let scores = predict_pairs::<NdArray, _>(&MeanGap, &pairs, None, 3, &device).unwrap();
        assert_eq!(scores, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_predict_pairs_limit() {
        let pairs = indexed_pairs(5);
        let device = Default::default();
        let scores = predict_pairs::<NdArray, _>(&MeanGap, &pairs, Some(2), 32, &device).unwrap();
        assert_eq!(scores.len(), 2);
        let scores = predict_pairs::<NdArray, _>(&MeanGap, &pairs, Some(50), 32, &device).unwrap();
        assert_eq!(scores.len(), 5);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let pairs = indexed_pairs(2);
        let device = Default::default();
        assert!(matches!(
            predict_pairs::<NdArray, _>(&MeanGap, &pairs, None, 0, &device),
            Err(AnalysisError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn test_predict_images() {
        let images = Array4::from_shape_fn((4, 1, 1, 1), |(i, _, _, _)| (i * 2) as f32);
        let device = Default::default();
        let scores = predict_images::<NdArray, _>(&MeanGap, images.view(), 3, &device).unwrap();
        assert_eq!(scores, vec![0.0, 2.0, 4.0, 6.0]);
    }
}
