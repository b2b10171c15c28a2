//! Model and scaler artifact loader

use super::scorer::{LogisticRegression, Scorer};
use super::tree::{GradientBoosting, RandomForest};
use crate::error::ArtifactError;
use crate::normalizer::StandardScaler;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Serialized model, tagged by algorithm family
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl ModelArtifact {
    fn into_scorer(self, path: &Path) -> Result<Box<dyn Scorer>, ArtifactError> {
        let checked = match &self {
            Self::LogisticRegression(m) => m.validate(),
            Self::RandomForest(m) => m.validate(),
            Self::GradientBoosting(m) => m.validate(),
        };
        checked.map_err(|reason| ArtifactError::invalid(path, reason))?;

        Ok(match self {
            Self::LogisticRegression(m) => Box::new(m),
            Self::RandomForest(m) => Box::new(m),
            Self::GradientBoosting(m) => Box::new(m),
        })
    }
}

/// Loader for persisted artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self { onnx_threads }
    }

    /// Load the fitted scaler shared by every model
    pub fn load_scaler(&self, path: &Path) -> Result<StandardScaler, ArtifactError> {
        let scaler: StandardScaler = read_json(path)?;
        scaler
            .validate()
            .map_err(|reason| ArtifactError::invalid(path, reason))?;

        info!(
            path = %path.display(),
            features = scaler.feature_count(),
            "Scaler loaded"
        );
        Ok(scaler)
    }

    /// Load a single model artifact from file
    pub fn load_model(&self, path: &Path, name: &str) -> Result<Box<dyn Scorer>, ArtifactError> {
        let scorer = if is_onnx(path) {
            self.load_onnx(path)?
        } else {
            read_json::<ModelArtifact>(path)?.into_scorer(path)?
        };

        info!(
            model = %name,
            family = scorer.family(),
            path = %path.display(),
            "Model loaded successfully"
        );
        Ok(scorer)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Scorer>, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Missing {
                path: path.to_path_buf(),
            });
        }
        let scorer = super::onnx::OnnxScorer::load(path, self.onnx_threads)
            .map_err(|e| ArtifactError::invalid(path, format!("{:#}", e)))?;
        Ok(Box::new(scorer))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Scorer>, ArtifactError> {
        Err(ArtifactError::Unsupported {
            path: path.to_path_buf(),
            reason: "built without the `onnx` feature".to_string(),
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_onnx(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
