//! Training curves rendered to PNG.
//!
//! [`CurvePlot`] holds the data and [`CurvePlot::render`] rasterises it.
//! Axes, grid lines, one polyline per series with epoch markers, and a
//! colour-swatch legend are drawn. Text is not rasterised; the title and
//! axis labels travel with the plot and are logged when it is saved.

use std::path::Path;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::canvas::{colors, Canvas};
use crate::error::{AnalysisError, Result};
use crate::history::TrainingHistory;

/// Visual settings for curve plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotStyle {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Space between the image border and the plot area.
    pub margin: u32,
    /// Line thickness in pixels.
    pub line_thickness: u32,
    /// Side of the square marker drawn at each epoch.
    pub marker_size: u32,
    /// Number of horizontal grid intervals.
    pub grid_lines: u32,
    /// Background colour.
    pub background: [u8; 3],
    /// Axis colour.
    pub axis_color: [u8; 3],
    /// Grid line colour.
    pub grid_color: [u8; 3],
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 48,
            line_thickness: 2,
            marker_size: 5,
            grid_lines: 5,
            background: colors::WHITE.0,
            axis_color: colors::DARK_GRAY.0,
            grid_color: colors::LIGHT_GRAY.0,
        }
    }
}

impl PlotStyle {
    /// Set the image size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the margin.
    #[must_use]
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }
}

/// One named series of per-epoch values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    /// Legend label.
    pub label: String,
    /// Value at epochs `1..=values.len()`.
    pub values: Vec<f32>,
    /// Line colour.
    pub color: [u8; 3],
}

/// A line chart of per-epoch series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurvePlot {
    /// Chart title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Series in drawing order.
    pub series: Vec<Series>,
}

impl CurvePlot {
    /// Create an empty plot with epochs on the x axis.
    pub fn new(title: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: "Epochs".to_string(),
            y_label: y_label.into(),
            series: Vec::new(),
        }
    }

    /// Add a series.
    #[must_use]
    pub fn with_series(mut self, label: impl Into<String>, values: &[f32], color: Rgb<u8>) -> Self {
        self.series.push(Series {
            label: label.into(),
            values: values.to_vec(),
            color: color.0,
        });
        self
    }

    /// Number of epochs on the x axis.
    pub fn epochs(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).max().unwrap_or(0)
    }

    /// Y range covering every finite value, padded by 5%.
    ///
    /// A constant series gets a unit-wide range around its value; no finite
    /// values gives `(0, 1)`.
    pub fn y_range(&self) -> (f32, f32) {
        let finite = self.series.iter().flat_map(|s| s.values.iter()).filter(|v| v.is_finite());
        let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        if min > max {
            return (0.0, 1.0);
        }
        if min == max {
            return (min - 0.5, max + 0.5);
        }
        let pad = (max - min) * 0.05;
        (min - pad, max + pad)
    }

    /// Rasterise the plot.
    pub fn render(&self, style: &PlotStyle) -> RgbImage {
        let mut canvas = Canvas::new(style.width, style.height, Rgb(style.background));

        let left = i64::from(style.margin);
        let top = i64::from(style.margin);
        let right = i64::from(style.width.saturating_sub(style.margin)).max(left + 1);
        let bottom = i64::from(style.height.saturating_sub(style.margin)).max(top + 1);
        let (y_min, y_max) = self.y_range();

        let grid = i64::from(style.grid_lines.max(1));
        for i in 0..=grid {
            let y = top + (bottom - top) * i / grid;
            canvas.line(left, y, right, y, Rgb(style.grid_color));
        }
        canvas.line(left, top, left, bottom, Rgb(style.axis_color));
        canvas.line(left, bottom, right, bottom, Rgb(style.axis_color));

        let epochs = self.epochs();
        let x_at = |epoch: usize| -> i64 {
            if epochs <= 1 {
                (left + right) / 2
            } else {
                left + ((right - left) as f64 * epoch as f64 / (epochs - 1) as f64).round() as i64
            }
        };
        let y_at = |v: f32| -> i64 {
            let t = f64::from((v - y_min) / (y_max - y_min));
            bottom - ((bottom - top) as f64 * t).round() as i64
        };

        let marker = style.marker_size;
        let half = i64::from(marker / 2);
        for series in &self.series {
            let color = Rgb(series.color);
            let mut previous: Option<(i64, i64)> = None;
            for (epoch, &v) in series.values.iter().enumerate() {
                if !v.is_finite() {
                    previous = None;
                    continue;
                }
                let point = (x_at(epoch), y_at(v));
                if let Some((px, py)) = previous {
                    canvas.thick_line(px, py, point.0, point.1, style.line_thickness, color);
                }
                canvas.fill_rect(point.0 - half, point.1 - half, marker, marker, color);
                previous = Some(point);
            }
        }

        // Legend swatches, stacked in the top-right corner of the plot area.
        let swatch_w = 24u32;
        let swatch_h = 6u32;
        for (i, series) in self.series.iter().enumerate() {
            let x = right - i64::from(swatch_w) - 8;
            let y = top + 8 + i as i64 * i64::from(swatch_h + 6);
            canvas.fill_rect(x - 2, y - 2, swatch_w + 4, swatch_h + 4, Rgb(style.axis_color));
            canvas.fill_rect(x, y, swatch_w, swatch_h, Rgb(series.color));
        }

        canvas.into_image()
    }

    /// Render with `style` and write a PNG to `path`.
    pub fn save(&self, path: impl AsRef<Path>, style: &PlotStyle) -> Result<()> {
        let path = path.as_ref();
        self.render(style).save(path)?;
        let labels: Vec<&str> = self.series.iter().map(|s| s.label.as_str()).collect();
        tracing::info!(
            "Saved '{}' ({} vs {}; {:?}) to {}",
            self.title,
            self.y_label,
            self.x_label,
            labels,
            path.display()
        );
        Ok(())
    }
}

/// Build a two-series plot; the training series is required.
fn history_plot(
    history: &TrainingHistory,
    title: &str,
    y_label: &str,
    train: (&str, &str),
    valid: (&str, &str),
) -> Result<CurvePlot> {
    let train_values = history
        .series(train.0)
        .ok_or_else(|| AnalysisError::MissingSeries(train.0.to_string()))?;
    let mut plot = CurvePlot::new(title, y_label).with_series(train.1, train_values, colors::BLUE);
    match history.series(valid.0) {
        Some(values) => plot = plot.with_series(valid.1, values, colors::RED),
        None => tracing::debug!("history has no '{}', plotting training only", valid.0),
    }
    Ok(plot)
}

/// Training (blue) and validation (red) loss curves.
pub fn loss_plot(history: &TrainingHistory) -> Result<CurvePlot> {
    history_plot(
        history,
        "Training and Validation Losses",
        "Loss",
        (TrainingHistory::LOSS, "Train Loss"),
        (TrainingHistory::VAL_LOSS, "Validation Loss"),
    )
}

/// Training (blue) and validation (red) accuracy curves.
pub fn accuracy_plot(history: &TrainingHistory) -> Result<CurvePlot> {
    history_plot(
        history,
        "Training and Validation Accuracy",
        "Accuracy",
        (TrainingHistory::ACCURACY, "Train Accuracy"),
        (TrainingHistory::VAL_ACCURACY, "Validation Accuracy"),
    )
}

/// Write the loss curves of `history` to `path` as PNG.
pub fn plot_loss(history: &TrainingHistory, path: impl AsRef<Path>) -> Result<()> {
    loss_plot(history)?.save(path, &PlotStyle::default())
}

/// Write the accuracy curves of `history` to `path` as PNG.
pub fn plot_accuracy(history: &TrainingHistory, path: impl AsRef<Path>) -> Result<()> {
    accuracy_plot(history)?.save(path, &PlotStyle::default())
}
