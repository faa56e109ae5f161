//! Side-by-side rendering of twin-model predictions on image pairs.

use std::path::Path;

use burn::prelude::*;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use twinviz_core::{BaseNormalization, ImagePairs, TwinModel};

use crate::canvas::{colors, image_tile, Canvas};
use crate::error::{AnalysisError, Result};
use crate::inference::{predict_pairs, save_scores};

/// Layout and inference settings for [`plot_pair_predictions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionGridConfig {
    /// Maximum number of pairs rendered, taken from the start of the set.
    pub subset_size: usize,
    /// Side of each square image tile.
    pub tile_size: u32,
    /// Space around tiles.
    pub padding: u32,
    /// Height of the score bar.
    pub bar_height: u32,
    /// Pairs per forward pass.
    pub batch_size: usize,
    /// How float images map to 8-bit.
    pub base: BaseNormalization,
}

impl Default for PredictionGridConfig {
    fn default() -> Self {
        Self {
            subset_size: 300,
            tile_size: 96,
            padding: 8,
            bar_height: 6,
            batch_size: 32,
            base: BaseNormalization::SelfMax,
        }
    }
}

impl PredictionGridConfig {
    /// Set the subset size.
    #[must_use]
    pub fn with_subset_size(mut self, subset_size: usize) -> Self {
        self.subset_size = subset_size;
        self
    }

    /// Set the tile size.
    #[must_use]
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the base normalisation.
    #[must_use]
    pub fn with_base(mut self, base: BaseNormalization) -> Self {
        self.base = base;
        self
    }

    fn row_height(&self) -> u32 {
        self.tile_size + self.bar_height + 2 * self.padding
    }
}

/// Render one row per score: left image, right image, and a bar of length
/// `clamp(score, 0, 1)` under the right image.
///
/// Row `i` shows pair `i`; `scores.len()` rows are drawn.
pub fn render_prediction_grid(
    pairs: &ImagePairs,
    scores: &[f32],
    config: &PredictionGridConfig,
) -> Result<RgbImage> {
    if scores.len() > pairs.len() {
        return Err(AnalysisError::ScoreCount {
            scores: scores.len(),
            images: pairs.len(),
        });
    }

    let tile = config.tile_size;
    let pad = config.padding;
    let width = 3 * pad + 2 * tile;
    let height = pad + scores.len() as u32 * config.row_height();
    let mut canvas = Canvas::new(width, height, colors::WHITE);

    let left_x = i64::from(pad);
    let right_x = i64::from(2 * pad + tile);
    for (i, &score) in scores.iter().enumerate() {
        let y = i64::from(pad) + i as i64 * i64::from(config.row_height());
        canvas.blit(&image_tile(pairs.left(i), tile, config.base)?, left_x, y);
        canvas.blit(&image_tile(pairs.right(i), tile, config.base)?, right_x, y);

        let bar_y = y + i64::from(tile + pad / 2);
        canvas.score_bar(right_x, bar_y, tile, config.bar_height, score, colors::BLUE);
    }

    Ok(canvas.into_image())
}

/// Score the first `min(subset_size, N)` pairs and save the rendered grid.
///
/// The bars are clamped, so the exact scores are also written as a JSON
/// array next to the image (see [`scores_path`](crate::inference::scores_path)).
///
/// # Returns
///
/// The scores of the rendered pairs, in order.
pub fn plot_pair_predictions<B, M>(
    model: &M,
    pairs: &ImagePairs,
    config: &PredictionGridConfig,
    path: impl AsRef<Path>,
    device: &B::Device,
) -> Result<Vec<f32>>
where
    B: Backend,
    M: TwinModel<B>,
{
    let path = path.as_ref();
    let scores = predict_pairs(model, pairs, Some(config.subset_size), config.batch_size, device)?;
    render_prediction_grid(pairs, &scores, config)?.save(path)?;
    save_scores(path, &scores)?;
    tracing::info!("Saved predictions for {} pairs to {}", scores.len(), path.display());
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::tests::{indexed_pairs, MeanGap};
    use twinviz_core::backend::NdArray;

    fn small() -> PredictionGridConfig {
        PredictionGridConfig {
            tile_size: 4,
            padding: 2,
            bar_height: 2,
            ..Default::default()
        }
    }

    fn blue_in_row(image: &RgbImage, config: &PredictionGridConfig, row: u32) -> usize {
        let y = config.padding + row * config.row_height() + config.tile_size + config.padding / 2;
        (0..image.width()).filter(|&x| *image.get_pixel(x, y) == colors::BLUE).count()
    }

    #[test]
    fn test_grid_dimensions() {
        let config = small();
        let image = render_prediction_grid(&indexed_pairs(3), &[0.1, 0.2, 0.3], &config).unwrap();
        // 3 * 2 + 2 * 4 wide, 2 + 3 * (4 + 2 + 4) tall
        assert_eq!(image.dimensions(), (14, 32));
    }

    #[test]
    fn test_bars_clamped() {
        let config = small();
        let image = render_prediction_grid(&indexed_pairs(3), &[0.5, 2.0, -1.0], &config).unwrap();
        assert_eq!(blue_in_row(&image, &config, 0), 2);
        assert_eq!(blue_in_row(&image, &config, 1), 4);
        assert_eq!(blue_in_row(&image, &config, 2), 0);
    }

    #[test]
    fn test_too_many_scores() {
        let result = render_prediction_grid(&indexed_pairs(1), &[0.1, 0.2], &small());
        assert!(matches!(
            result,
            Err(AnalysisError::ScoreCount { scores: 2, images: 1 })
        ));
    }

    #[test]
    fn test_plot_pair_predictions_subset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.png");
        let config = small().with_subset_size(2);
        let device = Default::default();

        let scores =
            plot_pair_predictions::<NdArray, _>(&MeanGap, &indexed_pairs(5), &config, &path, &device)
                .unwrap();
        assert_eq!(scores, vec![0.0, 1.0]);

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (14, 22));
    }

    #[test]
    fn test_scores_written_next_to_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.png");
        let device = Default::default();

        // scores 0..4 lie outside the bar range but survive in the JSON
        let scores =
            plot_pair_predictions::<NdArray, _>(&MeanGap, &indexed_pairs(4), &small(), &path, &device)
                .unwrap();
        let json = std::fs::read_to_string(dir.path().join("pairs.json")).unwrap();
        let written: Vec<f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(written, scores);
        assert_eq!(written[3], 3.0);
    }

    #[test]
    fn test_subset_larger_than_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.png");
        let device = Default::default();

        let scores =
            plot_pair_predictions::<NdArray, _>(&MeanGap, &indexed_pairs(3), &small(), &path, &device)
                .unwrap();
        assert_eq!(scores.len(), 3);
    }
}
