//! twinviz CLI: saliency overlays, training curves, and prediction grids.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ndarray::Array3;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use twinviz_analysis::{
    plot_accuracy, plot_loss, plot_pair_predictions, plot_ranking_predict, scores_path,
    PredictionGridConfig, RankingGridConfig, TrainingHistory,
};
use twinviz_core::{array_to_tensor, load_rgb_array, stack_images, BaseNormalization, ImagePairs, ImageShape};
use twinviz_explain::{generate_saliency_map, FlatSaliency, SaliencyConfig};
use twinviz_models::{TwinRanker, TwinRankerConfig};

/// Backend for gradient computations.
type GradBackend = Autodiff<NdArray>;

/// Backend for inference only.
type InferBackend = NdArray;

#[derive(Parser)]
#[command(name = "twinviz")]
#[command(author, version)]
#[command(about = "Visualise twin (pairwise ranking) image models")]
#[command(long_about = "twinviz: saliency overlays, training curves and prediction grids for twin image models.

EXAMPLES:
  # Loss and accuracy curves from a Keras-style history file
  twinviz curves --history history.json --out-dir plots

  # Saliency overlay on the first image of a pair
  twinviz saliency --image1 a.png --image2 b.png --out overlay.png --checkpoint runs/ranker

  # Rank a set of images
  twinviz rank --images img/*.png --out ranking.png --checkpoint runs/ranker

  # Score pairs side by side
  twinviz pairs --left a1.png a2.png --right b1.png b2.png --out pairs.png

Without --checkpoint a TwinRanker is initialised from --seed.")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot loss and accuracy curves from a training history
    Curves {
        /// History JSON: {"loss": [...], "val_loss": [...], ...}
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Directory for loss_curve.png and accuracy_curve.png
        #[arg(long, default_value = ".", value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Render a saliency overlay for one image pair
    Saliency {
        /// Image the overlay is drawn on
        #[arg(long, value_name = "FILE")]
        image1: PathBuf,

        /// Second image of the pair
        #[arg(long, value_name = "FILE")]
        image2: PathBuf,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Map image values from MIN..MAX instead of 0..max(image)
        #[arg(long, value_name = "MIN,MAX", value_parser = parse_range)]
        fixed_range: Option<(f32, f32)>,

        /// Fail instead of rendering a blank heatmap when all gradients are zero
        #[arg(long)]
        fail_on_flat: bool,
    },
    /// Score images and render them ranked in a grid
    Rank {
        /// Images to rank (same size)
        #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
        images: Vec<PathBuf>,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Tiles per row
        #[arg(long, default_value = "5", value_name = "N")]
        columns: usize,
    },
    /// Score image pairs and render them side by side
    Pairs {
        /// First image of each pair
        #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
        left: Vec<PathBuf>,

        /// Second image of each pair
        #[arg(long, value_name = "FILE", num_args = 1.., required = true)]
        right: Vec<PathBuf>,

        /// Output PNG
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Maximum number of pairs rendered
        #[arg(long, default_value = "300", value_name = "N")]
        subset_size: usize,
    },
}

#[derive(clap::Args)]
struct ModelArgs {
    /// TwinRanker checkpoint (weights .mpk with a .json sidecar)
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Seed for a freshly initialised model
    #[arg(long, default_value = "42", value_name = "SEED")]
    seed: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Curves { history, out_dir } => handle_curves(&history, &out_dir),
        Commands::Saliency {
            image1,
            image2,
            out,
            model,
            fixed_range,
            fail_on_flat,
        } => handle_saliency(&image1, &image2, &out, &model, fixed_range, fail_on_flat),
        Commands::Rank {
            images,
            out,
            model,
            columns,
        } => handle_rank(&images, &out, &model, columns),
        Commands::Pairs {
            left,
            right,
            out,
            model,
            subset_size,
        } => handle_pairs(&left, &right, &out, &model, subset_size),
    }
}

/// Parse "MIN,MAX" into a pair of floats.
fn parse_range(value: &str) -> std::result::Result<(f32, f32), String> {
    let (min, max) = value
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got '{}'", value))?;
    let min: f32 = min.trim().parse().map_err(|e| format!("invalid MIN: {}", e))?;
    let max: f32 = max.trim().parse().map_err(|e| format!("invalid MAX: {}", e))?;
    Ok((min, max))
}

fn load_image(path: &Path) -> Result<Array3<f32>> {
    load_rgb_array(path).with_context(|| format!("Failed to read image '{}'", path.display()))
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<Array3<f32>>> {
    paths.iter().map(|p| load_image(p)).collect()
}

/// Load a checkpoint, or initialise a fresh model for `shape` from `seed`.
fn load_model<B: Backend>(args: &ModelArgs, shape: ImageShape, device: &B::Device) -> Result<TwinRanker<B>> {
    match &args.checkpoint {
        Some(path) => {
            let (config, model) = TwinRankerConfig::load::<B>(path, device)
                .with_context(|| format!("Failed to load checkpoint '{}'", path.display()))?;
            if config.image_shape != shape {
                bail!(
                    "Checkpoint expects images {}, got {}",
                    config.image_shape,
                    shape
                );
            }
            Ok(model)
        }
        None => {
            tracing::warn!("No checkpoint given, using an untrained TwinRanker (seed {})", args.seed);
            B::seed(args.seed);
            Ok(TwinRankerConfig::new(shape).init::<B>(device))
        }
    }
}

fn image_shape(image: &Array3<f32>) -> Result<ImageShape> {
    Ok(ImageShape::from_dims(image.shape())?)
}

fn handle_curves(history: &Path, out_dir: &Path) -> Result<()> {
    let history = TrainingHistory::from_json_file(history)
        .with_context(|| format!("Failed to read history '{}'", history.display()))?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'", out_dir.display()))?;

    let loss_path = out_dir.join("loss_curve.png");
    let accuracy_path = out_dir.join("accuracy_curve.png");
    plot_loss(&history, &loss_path).context("Failed to plot loss")?;
    plot_accuracy(&history, &accuracy_path).context("Failed to plot accuracy")?;

    println!("Epochs: {}", history.epochs());
    if let Some(best) = history.best_epoch() {
        println!("Best epoch (val_loss): {}", best + 1);
    }
    println!("Wrote {}", loss_path.display());
    println!("Wrote {}", accuracy_path.display());
    Ok(())
}

fn handle_saliency(
    image1: &Path,
    image2: &Path,
    out: &Path,
    model_args: &ModelArgs,
    fixed_range: Option<(f32, f32)>,
    fail_on_flat: bool,
) -> Result<()> {
    let device = Default::default();
    let first = load_image(image1)?;
    let second = load_image(image2)?;
    let shape = image_shape(&first)?;
    if image_shape(&second)? != shape {
        bail!("Images differ in size: {} vs {}", shape, image_shape(&second)?);
    }

    let model = load_model::<GradBackend>(model_args, shape, &device)?;

    let mut config = SaliencyConfig::default();
    if let Some((min, max)) = fixed_range {
        config = config.with_base(BaseNormalization::Range { min, max });
    }
    if fail_on_flat {
        config = config.with_flat(FlatSaliency::Fail);
    }

    let overlay = generate_saliency_map(
        &model,
        array_to_tensor::<GradBackend>(first.view(), &device),
        array_to_tensor::<GradBackend>(second.view(), &device),
        &config,
    )
    .context("Failed to compute saliency")?;
    overlay
        .save(out)
        .with_context(|| format!("Failed to write '{}'", out.display()))?;

    println!("Wrote {}", out.display());
    Ok(())
}

fn handle_rank(images: &[PathBuf], out: &Path, model_args: &ModelArgs, columns: usize) -> Result<()> {
    let device = Default::default();
    let arrays = load_images(images)?;
    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    let batch = stack_images(&views).context("Images must share one size")?;
    let shape = image_shape(&arrays[0])?;

    let model = load_model::<InferBackend>(model_args, shape, &device)?;
    let config = RankingGridConfig::default().with_columns(columns);
    let ranked = plot_ranking_predict::<InferBackend, _>(&model, batch.view(), out, &config, &device)
        .context("Failed to rank images")?;

    for (position, entry) in ranked.iter().enumerate() {
        println!(
            "{:>3}. {:<40} {:.4}",
            position + 1,
            images[entry.index].display(),
            entry.score
        );
    }
    println!("Wrote {} and {}", out.display(), scores_path(out).display());
    Ok(())
}

fn handle_pairs(
    left: &[PathBuf],
    right: &[PathBuf],
    out: &Path,
    model_args: &ModelArgs,
    subset_size: usize,
) -> Result<()> {
    if left.len() != right.len() {
        bail!("Got {} left images but {} right images", left.len(), right.len());
    }
    let device = Default::default();
    let left_arrays = load_images(left)?;
    let right_arrays = load_images(right)?;
    let left_views: Vec<_> = left_arrays.iter().map(|a| a.view()).collect();
    let right_views: Vec<_> = right_arrays.iter().map(|a| a.view()).collect();
    let pairs = ImagePairs::from_images(&left_views, &right_views).context("Images must share one size")?;

    let model = load_model::<InferBackend>(model_args, pairs.image_shape(), &device)?;
    let config = PredictionGridConfig::default().with_subset_size(subset_size);
    let scores = plot_pair_predictions::<InferBackend, _>(&model, &pairs, &config, out, &device)
        .context("Failed to score pairs")?;

    for (i, score) in scores.iter().enumerate() {
        println!("{} | {}: {:.4}", left[i].display(), right[i].display(), score);
    }
    println!("Wrote {} and {}", out.display(), scores_path(out).display());
    Ok(())
}
