pub mod features;
pub mod model;

pub use features::*;
pub use model::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Required feature missing: {0}")]
    MissingFeature(String),

    #[error("Feature {0} is not a finite number")]
    MalformedFeature(String),

    #[error("Feature vector has {actual} dimensions, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model initialization failed: {0}")]
    ModelInit(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),
}
