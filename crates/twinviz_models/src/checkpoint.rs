//! Model checkpointing.
//!
//! Weights are stored with burn's named MessagePack recorder (`*.mpk`, the
//! extension is set by the recorder). A [`CheckpointMetadata`] JSON sidecar
//! next to the weights records the architecture and its configuration so the
//! model can be rebuilt before the record is loaded.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use serde::Serialize;

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Checkpoint-related errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Error saving checkpoint.
    #[error("Failed to save checkpoint: {0}")]
    Save(String),

    /// Error loading checkpoint.
    #[error("Failed to load checkpoint: {0}")]
    Load(String),

    /// Metadata names a different architecture.
    #[error("Checkpoint holds '{found}', expected '{expected}'")]
    WrongArch {
        /// Architecture the caller asked for.
        expected: String,
        /// Architecture recorded in the metadata.
        found: String,
    },
}

/// Path of the metadata sidecar for a checkpoint path.
pub fn metadata_path(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension("json")
}

/// Save a model's weights to `path` (extension replaced by `.mpk`).
pub fn save_model<B, M>(model: &M, path: impl AsRef<Path>) -> Result<()>
where
    B: Backend,
    M: Module<B>,
{
    let path = path.as_ref();
    let record = model.clone().into_record();
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    Recorder::<B>::record(&recorder, record, path.to_path_buf())
        .map_err(|e| CheckpointError::Save(e.to_string()))?;
    tracing::info!("Saved model weights to {}", path.with_extension("mpk").display());
    Ok(())
}

/// Load a model record from `path` (extension replaced by `.mpk`).
pub fn load_record<B, M>(path: impl AsRef<Path>, device: &B::Device) -> Result<M::Record>
where
    B: Backend,
    M: Module<B>,
{
    let path = path.as_ref();
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    Recorder::<B>::load(&recorder, path.to_path_buf(), device)
        .map_err(|e| CheckpointError::Load(e.to_string()))
}

/// Model checkpoint metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CheckpointMetadata {
    /// Model architecture name.
    pub arch: String,
    /// Model configuration as JSON.
    pub config_json: String,
}

impl CheckpointMetadata {
    /// Create new metadata for a model.
    pub fn new(arch: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            config_json: String::new(),
        }
    }

    /// Set the config JSON.
    pub fn with_config<C: Serialize>(mut self, config: &C) -> Result<Self> {
        self.config_json =
            serde_json::to_string(config).map_err(|e| CheckpointError::Save(e.to_string()))?;
        Ok(self)
    }

    /// Parse the stored configuration.
    pub fn config<C: serde::de::DeserializeOwned>(&self) -> Result<C> {
        serde_json::from_str(&self.config_json).map_err(|e| CheckpointError::Load(e.to_string()))
    }

    /// Fail unless the metadata describes `arch`.
    pub fn ensure_arch(&self, arch: &str) -> Result<()> {
        if self.arch != arch {
            return Err(CheckpointError::WrongArch {
                expected: arch.to_string(),
                found: self.arch.clone(),
            });
        }
        Ok(())
    }

    /// Save metadata to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::Save(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CheckpointError::Save(e.to_string()))?;
        Ok(())
    }

    /// Load metadata from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| CheckpointError::Load(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::Load(e.to_string()))
    }
}
