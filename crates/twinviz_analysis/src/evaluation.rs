//! Test-set evaluation for twin models.
//!
//! A twin model is scored as a binary classifier: column 0 of its output is
//! read as the probability that the pair's label is 1.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use twinviz_core::{ImagePairs, TwinModel};

use crate::error::{AnalysisError, Result};
use crate::inference::predict_pairs;

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
const EPSILON: f64 = 1e-7;

/// Configuration for [`evaluate_pairs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Pairs per forward pass.
    pub batch_size: usize,
    /// Scores strictly above this are predicted positive.
    pub threshold: f32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            threshold: 0.5,
        }
    }
}

impl EvaluationConfig {
    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the decision threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Evaluation results with per-pair scores and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Mean binary cross-entropy.
    pub loss: f32,
    /// Fraction of correctly classified pairs.
    pub accuracy: f32,
    /// Number of correct predictions.
    pub correct: usize,
    /// Total number of pairs.
    pub total: usize,
    /// Column 0 of the model output for each pair.
    pub scores: Vec<f32>,
}

impl EvaluationResult {
    /// Printable two-line summary.
    pub fn summary(&self) -> String {
        format!("Test Loss: {}\nTest Accuracy: {}", self.loss, self.accuracy)
    }
}

/// Mean binary cross-entropy between probabilities and 0/1 labels.
///
/// Returns 0.0 for empty input.
pub fn binary_cross_entropy(scores: &[f32], labels: &[f32]) -> f32 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f64 = scores
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = f64::from(p).clamp(EPSILON, 1.0 - EPSILON);
            let y = f64::from(y);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    (total / scores.len() as f64) as f32
}

/// Evaluate a twin model on a labelled pair set.
///
/// # Arguments
///
/// * `model` - The trained model
/// * `pairs` - Labelled test pairs
/// * `config` - Batch size and decision threshold
/// * `device` - Device to run inference on
///
/// # Returns
///
/// Loss, accuracy and the raw scores. Both metrics are also logged.
pub fn evaluate_pairs<B, M>(
    model: &M,
    pairs: &ImagePairs,
    config: &EvaluationConfig,
    device: &B::Device,
) -> Result<EvaluationResult>
where
    B: Backend,
    M: TwinModel<B>,
{
    let labels = pairs.labels().ok_or(AnalysisError::MissingLabels)?;
    let scores = predict_pairs(model, pairs, None, config.batch_size, device)?;

    let correct = scores
        .iter()
        .zip(labels)
        .filter(|(score, label)| (**score > config.threshold) == (**label > 0.5))
        .count();
    let total = scores.len();
    let accuracy = if total > 0 {
        correct as f32 / total as f32
    } else {
        0.0
    };
    let loss = binary_cross_entropy(&scores, labels);

    tracing::info!("Test Loss: {}", loss);
    tracing::info!("Test Accuracy: {}", accuracy);

    Ok(EvaluationResult {
        loss,
        accuracy,
        correct,
        total,
        scores,
    })
}
