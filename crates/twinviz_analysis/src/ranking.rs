//! Ranking single images by model score and rendering them as a grid.

use std::cmp::Ordering;
use std::path::Path;

use burn::prelude::*;
use image::RgbImage;
use ndarray::{s, ArrayView4};
use serde::{Deserialize, Serialize};
use twinviz_core::{BaseNormalization, RankingModel};

use crate::canvas::{colors, image_tile, Canvas};
use crate::error::{AnalysisError, Result};
use crate::inference::{predict_images, save_scores};

/// One image's position in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedImage {
    /// Index into the scored batch.
    pub index: usize,
    /// Model score.
    pub score: f32,
}

/// Grid settings for [`plot_ranking_predict`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingGridConfig {
    /// Tiles per row.
    pub columns: usize,
    /// Side of each square image tile.
    pub tile_size: u32,
    /// Space around tiles.
    pub padding: u32,
    /// Height of the score bar.
    pub bar_height: u32,
    /// Images per forward pass.
    pub batch_size: usize,
    /// How float images map to 8-bit.
    pub base: BaseNormalization,
}

impl Default for RankingGridConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            tile_size: 96,
            padding: 8,
            bar_height: 6,
            batch_size: 32,
            base: BaseNormalization::SelfMax,
        }
    }
}

impl RankingGridConfig {
    /// Set the number of columns.
    #[must_use]
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
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

    fn cell_width(&self) -> u32 {
        self.tile_size + self.padding
    }

    fn cell_height(&self) -> u32 {
        self.tile_size + self.bar_height + 2 * self.padding
    }
}

/// Order scores from highest to lowest.
///
/// Ties keep their input order and NaN scores go last.
pub fn rank_scores(scores: &[f32]) -> Vec<RankedImage> {
    let mut ranked: Vec<RankedImage> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| RankedImage { index, score })
        .collect();
    ranked.sort_by(|a, b| match (a.score.is_nan(), b.score.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal),
    });
    ranked
}

/// Score every image of an `(N, H, W, C)` batch and rank them.
pub fn rank_images<B, M>(
    model: &M,
    images: ArrayView4<'_, f32>,
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<RankedImage>>
where
    B: Backend,
    M: RankingModel<B>,
{
    let scores = predict_images(model, images, batch_size, device)?;
    Ok(rank_scores(&scores))
}

/// Fraction of the bar filled for `score` given the finite score range.
fn bar_fraction(score: f32, min: f32, max: f32) -> f32 {
    if !score.is_finite() {
        return f32::NAN;
    }
    if max > min {
        (score - min) / (max - min)
    } else {
        1.0
    }
}

/// Lay ranked images out row-major, `columns` per row, each with a score bar.
///
/// Bars are min-max normalised over the finite scores shown; when all
/// scores are equal every bar is full.
pub fn render_ranking_grid(
    images: ArrayView4<'_, f32>,
    ranked: &[RankedImage],
    config: &RankingGridConfig,
) -> Result<RgbImage> {
    let len = images.shape()[0];
    if let Some(bad) = ranked.iter().find(|r| r.index >= len) {
        return Err(AnalysisError::IndexOutOfRange { index: bad.index, len });
    }

    let columns = config.columns.max(1).min(ranked.len().max(1));
    let rows = ranked.len().div_ceil(columns);
    let width = config.padding + columns as u32 * config.cell_width();
    let height = config.padding + rows as u32 * config.cell_height();
    let mut canvas = Canvas::new(width, height, colors::WHITE);

    let (min, max) = ranked
        .iter()
        .map(|r| r.score)
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    for (position, entry) in ranked.iter().enumerate() {
        let x = i64::from(config.padding) + (position % columns) as i64 * i64::from(config.cell_width());
        let y = i64::from(config.padding) + (position / columns) as i64 * i64::from(config.cell_height());

        let tile = image_tile(
            images.slice(s![entry.index, .., .., ..]),
            config.tile_size,
            config.base,
        )?;
        canvas.blit(&tile, x, y);

        let bar_y = y + i64::from(config.tile_size + config.padding / 2);
        let fraction = bar_fraction(entry.score, min, max);
        canvas.score_bar(x, bar_y, config.tile_size, config.bar_height, fraction, colors::RED);
    }

    Ok(canvas.into_image())
}

/// Rank `images` with `model` and save the grid to `path`.
///
/// The ranking (index and score per tile, in grid order) is also written as
/// JSON next to the image.
///
/// # Returns
///
/// The ranking that was rendered.
pub fn plot_ranking_predict<B, M>(
    model: &M,
    images: ArrayView4<'_, f32>,
    path: impl AsRef<Path>,
    config: &RankingGridConfig,
    device: &B::Device,
) -> Result<Vec<RankedImage>>
where
    B: Backend,
    M: RankingModel<B>,
{
    let path = path.as_ref();
    let ranked = rank_images(model, images, config.batch_size, device)?;
    if let Some(top) = ranked.first() {
        tracing::info!("Top ranked image: #{} (score {})", top.index, top.score);
    }
    render_ranking_grid(images, &ranked, config)?.save(path)?;
    save_scores(path, &ranked)?;
    tracing::info!("Saved ranking of {} images to {}", ranked.len(), path.display());
    Ok(ranked)
}
