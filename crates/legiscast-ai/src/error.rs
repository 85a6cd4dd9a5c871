use std::path::PathBuf;

use thiserror::Error;

use crate::stage::{Stage, Task};

/// Structural failure while scoring a classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("tree node {index} does not exist")]
    MissingNode { index: usize },

    #[error("tree splits on feature {feature} but the input has {width} columns")]
    FeatureOutOfRange { feature: usize, width: usize },

    #[error("tree contains a cycle")]
    Cycle,

    #[error("ensemble has no members")]
    EmptyEnsemble,

    #[error("model expects {expected} inputs, got {got}")]
    WidthMismatch { expected: usize, got: usize },

    #[error("model produced a non-finite probability")]
    NonFinite,
}

/// Failure loading or validating one bundle artifact.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle file not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("file holds the {found} bundle, expected {expected}")]
    WrongKey { expected: String, found: String },

    #[error("invalid bundle: {0}")]
    Invalid(String),

    #[error("invalid calibrated ensemble: {0}")]
    Ensemble(#[from] ScoreError),
}

/// Failures that reach the caller of a prediction.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("bill not found: upstream returned no bill data")]
    BillNotFound,

    #[error("no usable {task} model for stage {stage}: {reason}")]
    BundleMissing {
        task: Task,
        stage: Stage,
        reason: String,
    },

    #[error("{task} model for stage {stage} failed to score: {source}")]
    Scoring {
        task: Task,
        stage: Stage,
        source: ScoreError,
    },
}
