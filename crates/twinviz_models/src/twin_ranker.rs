//! TwinRanker: a siamese MLP that scores images and compares pairs.

use std::path::Path;

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;
use serde::{Deserialize, Serialize};
use twinviz_core::{ImageShape, RankingModel, TwinModel};

use crate::checkpoint::{load_record, metadata_path, save_model, CheckpointMetadata, Result};

/// Configuration for [`TwinRanker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinRankerConfig {
    /// Shape of each input image.
    pub image_shape: ImageShape,
    /// Width of the hidden layer.
    pub hidden_size: usize,
}

impl Default for TwinRankerConfig {
    fn default() -> Self {
        Self {
            image_shape: ImageShape::new(32, 32, 3),
            hidden_size: 64,
        }
    }
}

impl TwinRankerConfig {
    /// Architecture name stored in checkpoint metadata.
    pub const ARCH: &'static str = "TwinRanker";

    /// Create a config for images of `image_shape`.
    pub fn new(image_shape: ImageShape) -> Self {
        Self {
            image_shape,
            ..Default::default()
        }
    }

    /// Set the hidden layer width.
    #[must_use]
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TwinRanker<B> {
        TwinRanker::new(self, device)
    }

    /// Rebuild a model from a checkpoint written by [`TwinRanker::save`].
    ///
    /// The config comes from the metadata sidecar, the weights from the
    /// record.
    pub fn load<B: Backend>(path: impl AsRef<Path>, device: &B::Device) -> Result<(Self, TwinRanker<B>)> {
        let path = path.as_ref();
        let metadata = CheckpointMetadata::load(metadata_path(path))?;
        metadata.ensure_arch(Self::ARCH)?;
        let config: Self = metadata.config()?;

        let record = load_record::<B, TwinRanker<B>>(path, device)?;
        let model = config.init::<B>(device).load_record(record);
        tracing::info!("Loaded {} for images {}", Self::ARCH, config.image_shape);
        Ok((config, model))
    }
}

/// Twin ranking model.
///
/// Both images pass through the same scoring branch; the pair output is the
/// probability that the first image ranks above the second.
///
/// # Architecture
///
/// ```text
/// Image (N, H, W, C)
///       |
///       +---> [Flatten] -> (N, H*W*C)
///       |
///       +---> [Linear + ReLU] -> (N, hidden)
///       |
///       +---> [Linear] -> score (N, 1)
///
/// forward(a, b) = sigmoid(score(a) - score(b))
/// ```
#[derive(Module, Debug)]
pub struct TwinRanker<B: Backend> {
    hidden: Linear<B>,
    activation: Relu,
    head: Linear<B>,
    /// Flattened input size.
    #[module(skip)]
    in_features: usize,
}

impl<B: Backend> TwinRanker<B> {
    /// Create a new model.
    pub fn new(config: &TwinRankerConfig, device: &B::Device) -> Self {
        let in_features = config.image_shape.numel();
        Self {
            hidden: LinearConfig::new(in_features, config.hidden_size).init(device),
            activation: Relu::new(),
            head: LinearConfig::new(config.hidden_size, 1).init(device),
            in_features,
        }
    }

    /// Number of values per input image.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    fn branch(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [n, _, _, _] = images.dims();
        let x = images.reshape([n, self.in_features]);
        let x = self.activation.forward(self.hidden.forward(x));
        self.head.forward(x)
    }

    /// Write weights and a metadata sidecar describing `config`.
    pub fn save(&self, config: &TwinRankerConfig, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_model::<B, Self>(self, path)?;
        CheckpointMetadata::new(TwinRankerConfig::ARCH)
            .with_config(config)?
            .save(metadata_path(path))
    }
}

impl<B: Backend> RankingModel<B> for TwinRanker<B> {
    fn score(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.branch(images)
    }
}

impl<B: Backend> TwinModel<B> for TwinRanker<B> {
    fn forward(&self, image1: Tensor<B, 4>, image2: Tensor<B, 4>) -> Tensor<B, 2> {
        sigmoid(self.branch(image1) - self.branch(image2))
    }
}
