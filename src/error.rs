//! Error types for artifact loading and prediction serving.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading model and normalizer artifacts at startup.
///
/// Any of these aborts startup; the service never runs with a partially
/// loaded registry.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Artifact file does not exist.
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    /// Artifact file exists but could not be read.
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact is not a valid document of the expected shape.
    #[error("corrupt artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but its parameters are unusable.
    #[error("invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Model was fitted on a different number of features than the normalizer.
    #[error("model '{model}' expects {model_features} features but the normalizer was fitted on {normalizer_features}")]
    ArityMismatch {
        model: String,
        model_features: usize,
        normalizer_features: usize,
    },

    /// Same model key configured twice.
    #[error("duplicate model key '{0}' in configuration")]
    DuplicateKey(String),

    /// Artifact format not supported by this build.
    #[error("unsupported artifact {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },
}

impl ArtifactError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors returned by the prediction engine for a single request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    /// Feature vector length differs from the fitted arity.
    #[error("expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// Feature value is NaN or infinite.
    #[error("feature at index {index} is not a finite number ({value})")]
    InvalidFeature { index: usize, value: f64 },

    /// Requested model key is not registered.
    #[error("model '{requested}' not found; available models: {}", available.join(", "))]
    UnknownModel {
        requested: String,
        available: Vec<String>,
    },

    /// No model requested and none are loaded.
    #[error("no models are loaded")]
    EmptyRegistry,

    /// Scorer produced an unusable value.
    #[error("model '{model}' failed to score: {reason}")]
    ScoringFailed { model: String, reason: String },
}

impl PredictionError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::InvalidFeature { .. } => "invalid_feature",
            Self::UnknownModel { .. } => "unknown_model",
            Self::EmptyRegistry => "empty_registry",
            Self::ScoringFailed { .. } => "scoring_failed",
        }
    }

    /// Whether the caller caused the error and can fix it by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaMismatch { .. } | Self::InvalidFeature { .. } | Self::UnknownModel { .. }
        )
    }
}
