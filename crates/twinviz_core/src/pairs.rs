//! Paired image sets for twin models.

use burn::prelude::*;
use ndarray::{s, Array4, ArrayView3, ArrayView4};

use crate::error::{CoreError, Result};
use crate::imaging::batch_to_tensor;
use crate::shape::ImageShape;

/// A set of `N` image pairs with optional per-pair labels.
///
/// Both sides are stored as `(N, H, W, C)` arrays and share the same
/// per-image shape.
#[derive(Debug, Clone)]
pub struct ImagePairs {
    left: Array4<f32>,
    right: Array4<f32>,
    labels: Option<Vec<f32>>,
}

impl ImagePairs {
    /// Create a pair set from left and right image batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the two batches differ in shape.
    pub fn new(left: Array4<f32>, right: Array4<f32>) -> Result<Self> {
        if left.shape() != right.shape() {
            return Err(CoreError::ShapeMismatch(format!(
                "left {:?} vs right {:?}",
                left.shape(),
                right.shape()
            )));
        }
        Ok(Self {
            left,
            right,
            labels: None,
        })
    }

    /// Attach one label per pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of labels differs from the number of pairs.
    pub fn with_labels(mut self, labels: Vec<f32>) -> Result<Self> {
        if labels.len() != self.len() {
            return Err(CoreError::InvalidShape {
                expected: format!("{} labels", self.len()),
                got: format!("{} labels", labels.len()),
            });
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Build a pair set from individual `(H, W, C)` images.
    ///
    /// # Errors
    ///
    /// Returns an error if the lists differ in length, are empty, or the
    /// images do not all share one shape.
    pub fn from_images(left: &[ArrayView3<'_, f32>], right: &[ArrayView3<'_, f32>]) -> Result<Self> {
        if left.len() != right.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} left images vs {} right images",
                left.len(),
                right.len()
            )));
        }
        let left = stack_images(left)?;
        let right = stack_images(right)?;
        Self::new(left, right)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.left.shape()[0]
    }

    /// Whether the set holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape of a single image.
    pub fn image_shape(&self) -> ImageShape {
        let dims = self.left.shape();
        ImageShape::new(dims[1], dims[2], dims[3])
    }

    /// Labels, if attached.
    pub fn labels(&self) -> Option<&[f32]> {
        self.labels.as_deref()
    }

    /// Left image of pair `index`.
    pub fn left(&self, index: usize) -> ArrayView3<'_, f32> {
        self.left.slice(s![index, .., .., ..])
    }

    /// Right image of pair `index`.
    pub fn right(&self, index: usize) -> ArrayView3<'_, f32> {
        self.right.slice(s![index, .., .., ..])
    }

    /// All left images.
    pub fn left_batch(&self) -> ArrayView4<'_, f32> {
        self.left.view()
    }

    /// All right images.
    pub fn right_batch(&self) -> ArrayView4<'_, f32> {
        self.right.view()
    }

    /// Copy pairs `range` to the device as two `(n, H, W, C)` tensors.
    pub fn batch_tensors<B: Backend>(
        &self,
        range: std::ops::Range<usize>,
        device: &B::Device,
    ) -> (Tensor<B, 4>, Tensor<B, 4>) {
        let left = self.left.slice(s![range.clone(), .., .., ..]);
        let right = self.right.slice(s![range, .., .., ..]);
        (batch_to_tensor(left, device), batch_to_tensor(right, device))
    }
}

/// Stack same-shaped `(H, W, C)` images into one `(N, H, W, C)` array.
///
/// # Errors
///
/// Returns an error if `images` is empty or the shapes differ.
pub fn stack_images(images: &[ArrayView3<'_, f32>]) -> Result<Array4<f32>> {
    let first = images.first().ok_or_else(|| CoreError::InvalidShape {
        expected: "at least one image".to_string(),
        got: "none".to_string(),
    })?;
    let (h, w, c) = first.dim();
    let mut stacked = Array4::zeros((images.len(), h, w, c));
    for (i, image) in images.iter().enumerate() {
        if image.dim() != (h, w, c) {
            return Err(CoreError::ShapeMismatch(format!(
                "image {} has shape {:?}, expected {:?}",
                i,
                image.dim(),
                (h, w, c)
            )));
        }
        stacked.slice_mut(s![i, .., .., ..]).assign(image);
    }
    Ok(stacked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_pairs_shape_checks() {
        let left = Array4::<f32>::zeros((3, 4, 4, 3));
        let right = Array4::<f32>::zeros((3, 4, 4, 3));
        let pairs = ImagePairs::new(left, right).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.image_shape(), ImageShape::new(4, 4, 3));
        assert!(pairs.labels().is_none());

        let bad = ImagePairs::new(Array4::zeros((3, 4, 4, 3)), Array4::zeros((2, 4, 4, 3)));
        assert!(matches!(bad, Err(CoreError::ShapeMismatch(_))));
    }

    #[test]
    fn test_with_labels_length() {
        let pairs = ImagePairs::new(Array4::zeros((2, 1, 1, 1)), Array4::zeros((2, 1, 1, 1))).unwrap();
        assert!(pairs.clone().with_labels(vec![1.0]).is_err());
        let labelled = pairs.with_labels(vec![1.0, 0.0]).unwrap();
        assert_eq!(labelled.labels(), Some(&[1.0, 0.0][..]));
    }

    #[test]
    fn test_from_images() {
        let a = Array3::from_elem((2, 2, 3), 1.0f32);
        let b = Array3::from_elem((2, 2, 3), 2.0f32);
        let pairs = ImagePairs::from_images(&[a.view(), b.view()], &[b.view(), a.view()]).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.left(1)[[0, 0, 0]], 2.0);
        assert_eq!(pairs.right(1)[[0, 0, 0]], 1.0);

        let odd = Array3::from_elem((3, 2, 3), 0.0f32);
        assert!(ImagePairs::from_images(&[a.view()], &[odd.view()]).is_err());
        assert!(ImagePairs::from_images(&[], &[]).is_err());
    }

    #[cfg(feature = "backend-ndarray")]
    #[test]
    fn test_batch_tensors() {
        use crate::backend::NdArray;

        let pairs = ImagePairs::new(Array4::zeros((5, 2, 2, 1)), Array4::ones((5, 2, 2, 1))).unwrap();
        let device = Default::default();
        let (l, r) = pairs.batch_tensors::<NdArray>(1..4, &device);
        assert_eq!(l.dims(), [3, 2, 2, 1]);
        let sum: f32 = r.sum().into_scalar().elem();
        assert!((sum - 12.0).abs() < 1e-6);
    }
}
