//! False-colour mappings from 8-bit intensity to RGB.

use image::{GrayImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Colormap applied to single-channel intensity images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Colormap {
    /// Blue (low) through cyan, yellow to dark red (high).
    #[default]
    Jet,
    /// Black through red and yellow to white.
    Hot,
}

impl Colormap {
    /// Colour for a single intensity.
    pub fn color(&self, value: u8) -> Rgb<u8> {
        let x = f32::from(value) / 255.0;
        let (r, g, b) = match self {
            Colormap::Jet => (
                1.5 - (4.0 * x - 3.0).abs(),
                1.5 - (4.0 * x - 2.0).abs(),
                1.5 - (4.0 * x - 1.0).abs(),
            ),
            Colormap::Hot => (3.0 * x, 3.0 * x - 1.0, 3.0 * x - 2.0),
        };
        Rgb([channel(r), channel(g), channel(b)])
    }

    /// Full 256-entry lookup table.
    pub fn lut(&self) -> [Rgb<u8>; 256] {
        let mut lut = [Rgb([0, 0, 0]); 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = self.color(i as u8);
        }
        lut
    }

    /// Map every pixel of `gray` through the colormap.
    pub fn apply(&self, gray: &GrayImage) -> RgbImage {
        let lut = self.lut();
        let (width, height) = gray.dimensions();
        RgbImage::from_fn(width, height, |x, y| lut[gray.get_pixel(x, y).0[0] as usize])
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(Colormap::Jet.color(0).0, [0, 0, 128]);
        assert_eq!(Colormap::Jet.color(255).0, [128, 0, 0]);
    }

    #[test]
    fn test_jet_midpoint_is_green_dominant() {
        let mid = Colormap::Jet.color(128).0;
        assert_eq!(mid[1], 255);
        assert!(mid[0] > 100 && mid[2] > 100);
    }

    #[test]
    fn test_jet_is_blue_low_red_high() {
        let low = Colormap::Jet.color(20).0;
        let high = Colormap::Jet.color(235).0;
        assert!(low[2] > low[0]);
        assert!(high[0] > high[2]);
    }

    #[test]
    fn test_hot_endpoints() {
        assert_eq!(Colormap::Hot.color(0).0, [0, 0, 0]);
        assert_eq!(Colormap::Hot.color(255).0, [255, 255, 255]);
    }

    #[test]
    fn test_apply_matches_lut() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 100 + y * 20) as u8]));
        let colored = Colormap::Jet.apply(&gray);
        assert_eq!(colored.dimensions(), (3, 2));
        let lut = Colormap::Jet.lut();
        for (x, y, pixel) in colored.enumerate_pixels() {
            assert_eq!(*pixel, lut[gray.get_pixel(x, y).0[0] as usize]);
        }
    }

    #[test]
    fn test_colormap_serde() {
        let json = serde_json::to_string(&Colormap::Hot).unwrap();
        let decoded: Colormap = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, Colormap::Hot);
    }
}
