//! # twinviz_models
//!
//! Reference twin ranking model and checkpoint utilities.
//!
//! - [`TwinRanker`] - shared MLP scoring branch, pairwise sigmoid head
//! - [`save_model`] / [`load_record`] - burn named MessagePack checkpoints
//! - [`CheckpointMetadata`] - JSON sidecar carrying the model config

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint;
pub mod twin_ranker;

pub use checkpoint::{
    load_record, metadata_path, save_model, CheckpointError, CheckpointMetadata,
};
pub use twin_ranker::{TwinRanker, TwinRankerConfig};
