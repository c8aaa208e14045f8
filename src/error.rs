//! Error types for assessment, attribution and model loading

use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a probability of default for one applicant.
///
/// Either variant means no PD exists for the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessmentError {
    /// The applicant record does not fit the schema the pipeline was fitted on
    #[error("applicant record does not match the fitted schema: {0}")]
    SchemaMismatch(String),

    /// The model stage rejected the transformed vector
    #[error("model inference failed: {0}")]
    Inference(String),
}

/// Invariant violation between the vectors handed to the explainer.
///
/// These indicate version skew between predictor and explainer. The
/// prediction itself is still valid when one of these is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributionError {
    #[error("feature vector has {values} values but {importances} importances")]
    ImportanceLengthMismatch { values: usize, importances: usize },

    #[error("feature vector has {values} values but {names} feature names")]
    NameLengthMismatch { values: usize, names: usize },

    #[error("probability of default {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("importance {value} at feature index {index} is negative or not finite")]
    InvalidImportance { index: usize, value: f64 },

    #[error("transformed value at feature index {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("sum of raw contributions overflowed")]
    ContributionOverflow,
}

/// Failure to load or validate a fitted model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("model kind `{0}` requires the `onnx` feature")]
    Unsupported(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}
