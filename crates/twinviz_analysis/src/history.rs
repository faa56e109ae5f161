//! Training history: named per-epoch metric series.
//!
//! The JSON form is a flat object of arrays, the shape Keras' `History.history`
//! serializes to:
//!
//! ```json
//! {"loss": [0.9, 0.6], "val_loss": [1.0, 0.7], "accuracy": [0.5, 0.7]}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-epoch metric series keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainingHistory {
    series: BTreeMap<String, Vec<f32>>,
}

impl TrainingHistory {
    /// Training loss.
    pub const LOSS: &'static str = "loss";
    /// Validation loss.
    pub const VAL_LOSS: &'static str = "val_loss";
    /// Training accuracy.
    pub const ACCURACY: &'static str = "accuracy";
    /// Validation accuracy.
    pub const VAL_ACCURACY: &'static str = "val_accuracy";

    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a whole series.
    #[must_use]
    pub fn with_series(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.series.insert(name.into(), values);
        self
    }

    /// Get a series by name.
    pub fn series(&self, name: &str) -> Option<&[f32]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// All series names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.series.keys().map(|s| s.as_str()).collect()
    }

    /// Number of epochs (length of the longest series).
    pub fn epochs(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Zero-based epoch with the lowest validation loss.
    pub fn best_epoch(&self) -> Option<usize> {
        self.series(Self::VAL_LOSS)?
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KERAS_JSON: &str = r#"{
        "loss": [0.693, 0.52, 0.41],
        "val_loss": [0.70, 0.48, 0.50],
        "accuracy": [0.51, 0.74, 0.83],
        "val_accuracy": [0.50, 0.77, 0.76]
    }"#;

    #[test]
    fn test_parse_keras_history() {
        let history = TrainingHistory::from_json_str(KERAS_JSON).unwrap();
        assert_eq!(history.epochs(), 3);
        assert_eq!(history.names(), vec!["accuracy", "loss", "val_accuracy", "val_loss"]);
        assert_eq!(history.series(TrainingHistory::LOSS).unwrap()[1], 0.52);
        assert!(history.series("lr").is_none());
    }

    #[test]
    fn test_best_epoch() {
        let history = TrainingHistory::from_json_str(KERAS_JSON).unwrap();
        assert_eq!(history.best_epoch(), Some(1));
        assert_eq!(TrainingHistory::new().best_epoch(), None);
    }

    #[test]
    fn test_builder_uneven_series() {
        let history = TrainingHistory::new()
            .with_series("loss", vec![1.0, 0.5])
            .with_series("val_loss", vec![0.7]);
        assert_eq!(history.series("loss"), Some(&[1.0, 0.5][..]));
        assert_eq!(history.epochs(), 2);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, KERAS_JSON).unwrap();

        let loaded = TrainingHistory::from_json_file(&path).unwrap();
        assert_eq!(loaded, TrainingHistory::from_json_str(KERAS_JSON).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TrainingHistory::from_json_file(dir.path().join("absent.json")),
            Err(crate::error::AnalysisError::IoError(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(TrainingHistory::from_json_str("[1, 2, 3]").is_err());
    }
}
