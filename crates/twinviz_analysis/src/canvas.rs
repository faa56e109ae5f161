//! Minimal raster drawing on top of [`image::RgbImage`].

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::ArrayView3;
use twinviz_core::{to_rgb8, BaseNormalization};

use crate::error::Result;

/// Common color definitions
pub mod colors {
    #![allow(missing_docs)]

    use image::Rgb;

    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
    pub const LIGHT_GRAY: Rgb<u8> = Rgb([220, 220, 220]);
    pub const DARK_GRAY: Rgb<u8> = Rgb([64, 64, 64]);
}

/// A drawable RGB image with clipped primitives.
///
/// Coordinates are signed so shapes may extend past the edges; anything
/// outside the image is dropped.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Create a canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    /// Canvas width.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Canvas height.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Set one pixel if it lies on the canvas.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height()) {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for dy in 0..i64::from(height) {
            for dx in 0..i64::from(width) {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    /// Draw a one-pixel line (Bresenham).
    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw a line `thickness` pixels wide.
    pub fn thick_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, thickness: u32, color: Rgb<u8>) {
        let thickness = i64::from(thickness.max(1));
        let lo = -(thickness - 1) / 2;
        let hi = thickness / 2;
        for oy in lo..=hi {
            for ox in lo..=hi {
                self.line(x0 + ox, y0 + oy, x1 + ox, y1 + oy, color);
            }
        }
    }

    /// Copy `tile` onto the canvas with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, tile: &RgbImage, x: i64, y: i64) {
        for (tx, ty, pixel) in tile.enumerate_pixels() {
            self.put(x + i64::from(tx), y + i64::from(ty), *pixel);
        }
    }

    /// Horizontal bar: a `track` of full width with `fraction` of it in `color`.
    ///
    /// `fraction` is clamped to `[0, 1]`; NaN draws only the track.
    pub fn score_bar(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        fraction: f32,
        color: Rgb<u8>,
    ) {
        self.fill_rect(x, y, width, height, colors::LIGHT_GRAY);
        if fraction.is_nan() {
            return;
        }
        let filled = (fraction.clamp(0.0, 1.0) * width as f32).round() as u32;
        self.fill_rect(x, y, filled, height, color);
    }

    /// Borrow the image.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Take the image.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Render a float image as a square `size x size` tile.
///
/// The longer side is scaled to `size` and the aspect ratio kept; the rest
/// of the tile is white, with the image centred.
pub fn image_tile(image: ArrayView3<'_, f32>, size: u32, base: BaseNormalization) -> Result<RgbImage> {
    let rgb = to_rgb8(image, base)?;
    let (width, height) = rgb.dimensions();
    if (width, height) == (size, size) {
        return Ok(rgb);
    }

    let longest = u64::from(width.max(height).max(1));
    let fit = |side: u32| {
        let scaled = (u64::from(side) * u64::from(size) + longest / 2) / longest;
        scaled.max(1) as u32
    };
    let (fit_w, fit_h) = (fit(width).min(size), fit(height).min(size));
    let resized = imageops::resize(&rgb, fit_w, fit_h, FilterType::Nearest);

    let mut tile = Canvas::new(size, size, colors::WHITE);
    tile.blit(
        &resized,
        i64::from((size - fit_w) / 2),
        i64::from((size - fit_h) / 2),
    );
    Ok(tile.into_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_put_clips() {
        let mut canvas = Canvas::new(4, 4, colors::WHITE);
        canvas.put(-1, 0, colors::BLACK);
        canvas.put(4, 4, colors::BLACK);
        canvas.put(3, 3, colors::BLACK);
        assert_eq!(*canvas.image().get_pixel(3, 3), colors::BLACK);
        assert_eq!(canvas.image().pixels().filter(|p| **p == colors::BLACK).count(), 1);
    }

    #[test]
    fn test_line_endpoints_and_diagonal() {
        let mut canvas = Canvas::new(5, 5, colors::WHITE);
        canvas.line(0, 0, 4, 4, colors::RED);
        for i in 0..5 {
            assert_eq!(*canvas.image().get_pixel(i, i), colors::RED);
        }
        assert_eq!(canvas.image().pixels().filter(|p| **p == colors::RED).count(), 5);
    }

    #[test]
    fn test_horizontal_line_reversed() {
        let mut canvas = Canvas::new(6, 2, colors::WHITE);
        canvas.line(5, 1, 0, 1, colors::BLUE);
        for x in 0..6 {
            assert_eq!(*canvas.image().get_pixel(x, 1), colors::BLUE);
        }
    }

    #[test]
    fn test_thick_line() {
        let mut canvas = Canvas::new(10, 10, colors::WHITE);
        canvas.thick_line(0, 5, 9, 5, 3, colors::BLUE);
        for y in 4..=6 {
            assert_eq!(*canvas.image().get_pixel(5, y), colors::BLUE);
        }
        assert_eq!(*canvas.image().get_pixel(5, 3), colors::WHITE);
    }

    #[test]
    fn test_score_bar() {
        let mut canvas = Canvas::new(10, 1, colors::WHITE);
        canvas.score_bar(0, 0, 10, 1, 0.3, colors::BLUE);
        let blue = canvas.image().pixels().filter(|p| **p == colors::BLUE).count();
        assert_eq!(blue, 3);
        assert_eq!(*canvas.image().get_pixel(9, 0), colors::LIGHT_GRAY);

        canvas.score_bar(0, 0, 10, 1, f32::NAN, colors::BLUE);
        assert!(canvas.image().pixels().all(|p| *p == colors::LIGHT_GRAY));
    }

    #[test]
    fn test_blit_and_tile() {
        let image = Array3::from_elem((2, 2, 3), 1.0f32);
        let tile = image_tile(image.view(), 4, BaseNormalization::SelfMax).unwrap();
        assert_eq!(tile.dimensions(), (4, 4));

        let mut canvas = Canvas::new(6, 6, colors::BLACK);
        canvas.blit(&tile, 4, 4);
        assert_eq!(*canvas.image().get_pixel(5, 5), colors::WHITE);
        assert_eq!(*canvas.image().get_pixel(3, 3), colors::BLACK);
    }

    #[test]
    fn test_tile_keeps_aspect_ratio() {
        // 2 rows by 4 columns of zeros renders black
        let image = Array3::<f32>::zeros((2, 4, 3));
        let tile = image_tile(image.view(), 8, BaseNormalization::SelfMax).unwrap();
        assert_eq!(tile.dimensions(), (8, 8));

        for x in 0..8 {
            assert_eq!(*tile.get_pixel(x, 0), colors::WHITE);
            assert_eq!(*tile.get_pixel(x, 1), colors::WHITE);
            for y in 2..6 {
                assert_eq!(*tile.get_pixel(x, y), colors::BLACK);
            }
            assert_eq!(*tile.get_pixel(x, 6), colors::WHITE);
            assert_eq!(*tile.get_pixel(x, 7), colors::WHITE);
        }
    }

    #[test]
    fn test_tall_tile_centred_horizontally() {
        let image = Array3::<f32>::zeros((6, 2, 1));
        let tile = image_tile(image.view(), 3, BaseNormalization::SelfMax).unwrap();
        // 6x2 scales to 3x1, centred in column 1
        for y in 0..3 {
            assert_eq!(*tile.get_pixel(0, y), colors::WHITE);
            assert_eq!(*tile.get_pixel(1, y), colors::BLACK);
            assert_eq!(*tile.get_pixel(2, y), colors::WHITE);
        }
    }
}
