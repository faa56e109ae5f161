//! Image shape metadata.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Shape metadata for a single channels-last image.
///
/// # Example
///
/// ```rust
/// use twinviz_core::ImageShape;
///
/// let shape = ImageShape::new(32, 48, 3);
/// assert_eq!(shape.height(), 32);
/// assert_eq!(shape.width(), 48);
/// assert_eq!(shape.channels(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    height: usize,
    width: usize,
    channels: usize,
}

impl ImageShape {
    /// Create a new shape.
    #[must_use]
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Create an ImageShape from a slice of dimensions `[H, W, C]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice doesn't contain exactly 3 elements.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match dims {
            [h, w, c] => Ok(Self::new(*h, *w, *c)),
            _ => Err(CoreError::InvalidShape {
                expected: "(H, W, C)".to_string(),
                got: format!("{:?}", dims),
            }),
        }
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixels (H * W).
    #[must_use]
    pub const fn pixels(&self) -> usize {
        self.height * self.width
    }

    /// Total number of elements (H * W * C).
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Check if any dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0 || self.channels == 0
    }

    /// Convert to an array.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.height, self.width, self.channels]
    }

    /// Shape of a batch of `n` such images.
    #[must_use]
    pub const fn batched(&self, n: usize) -> [usize; 4] {
        [n, self.height, self.width, self.channels]
    }

    /// Check that two images share height and width.
    ///
    /// Channel counts may differ.
    pub fn ensure_same_spatial(&self, other: &Self) -> Result<()> {
        if self.height != other.height || self.width != other.width {
            return Err(CoreError::ShapeMismatch(format!(
                "{}x{} vs {}x{}",
                self.height, self.width, other.height, other.width
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ImageShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.height, self.width, self.channels)
    }
}
