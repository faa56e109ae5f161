//! Weighted per-pixel blending.

use image::{Rgb, RgbImage};
use twinviz_core::CoreError;

use crate::error::Result;

/// Blend two same-sized RGB images.
///
/// Each output channel is `src1 * alpha + src2 * beta + gamma`, rounded to
/// the nearest integer (ties to even) and saturated to `[0, 255]`.
///
/// # Errors
///
/// Returns a shape mismatch if the images differ in size.
pub fn add_weighted(
    src1: &RgbImage,
    alpha: f64,
    src2: &RgbImage,
    beta: f64,
    gamma: f64,
) -> Result<RgbImage> {
    if src1.dimensions() != src2.dimensions() {
        return Err(CoreError::ShapeMismatch(format!(
            "blend inputs {:?} vs {:?}",
            src1.dimensions(),
            src2.dimensions()
        ))
        .into());
    }

    let (width, height) = src1.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let a = src1.get_pixel(x, y).0;
        let b = src2.get_pixel(x, y).0;
        let mix = |i: usize| {
            let v = f64::from(a[i]) * alpha + f64::from(b[i]) * beta + gamma;
            v.round_ties_even().clamp(0.0, 255.0) as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExplainError;

    fn gradient_image() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 120) as u8, 200]))
    }

    #[test]
    fn test_zero_heatmap_scales_base() {
        let base = gradient_image();
        let zeros = RgbImage::new(4, 3);
        let out = add_weighted(&base, 0.6, &zeros, 0.4, 0.0).unwrap();
        for (x, y, pixel) in out.enumerate_pixels() {
            let src = base.get_pixel(x, y).0;
            for c in 0..3 {
                let expected = (f64::from(src[c]) * 0.6).round_ties_even() as u8;
                assert_eq!(pixel.0[c], expected);
            }
        }
    }

    #[test]
    fn test_full_heatmap_adds_offset_and_clips() {
        let base = gradient_image();
        let full = RgbImage::from_pixel(4, 3, Rgb([255, 255, 255]));
        let out = add_weighted(&base, 0.6, &full, 0.4, 0.0).unwrap();
        for (x, y, pixel) in out.enumerate_pixels() {
            let src = base.get_pixel(x, y).0;
            for c in 0..3 {
                let expected = (f64::from(src[c]) * 0.6 + 102.0).round_ties_even().min(255.0) as u8;
                assert_eq!(pixel.0[c], expected);
            }
        }
    }

    #[test]
    fn test_saturation() {
        let white = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let out = add_weighted(&white, 1.0, &white, 1.0, 0.0).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
        let out = add_weighted(&white, -1.0, &white, 0.0, 0.0).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_gamma_offset() {
        let black = RgbImage::new(2, 2);
        let out = add_weighted(&black, 0.5, &black, 0.5, 10.4).unwrap();
        assert!(out.pixels().all(|p| p.0 == [10, 10, 10]));
    }

    #[test]
    fn test_size_mismatch() {
        let a = RgbImage::new(2, 2);
        let b = RgbImage::new(3, 2);
        assert!(matches!(
            add_weighted(&a, 0.5, &b, 0.5, 0.0),
            Err(ExplainError::CoreError(CoreError::ShapeMismatch(_)))
        ));
    }
}
