//! Prediction engine: model resolution, normalization, scoring and
//! post-processing for a single applicant.

use super::registry::{ModelDescriptor, ModelRegistry};
use crate::config::ModelsConfig;
use crate::error::{ArtifactError, PredictionError};
use crate::types::prediction::PredictionResult;
use tracing::{debug, info};

/// Stateless prediction engine over an immutable registry.
///
/// Every call is an independent transaction; the engine can be shared across
/// any number of concurrent callers.
#[derive(Debug)]
pub struct PredictionEngine {
    registry: ModelRegistry,
}

impl PredictionEngine {
    pub fn new(registry: ModelRegistry) -> Self {
        if let Some(default) = registry.default_model() {
            info!(
                models = registry.count(),
                default_model = %default.key(),
                features = registry.scaler().feature_count(),
                "Prediction engine initialized"
            );
        }
        Self { registry }
    }

    /// Load every configured artifact and build the engine
    pub fn from_config(config: &ModelsConfig) -> Result<Self, ArtifactError> {
        Ok(Self::new(ModelRegistry::load_all(config)?))
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Number of features every request must carry
    pub fn feature_count(&self) -> usize {
        self.registry.scaler().feature_count()
    }

    /// Score one applicant.
    ///
    /// With no `model_key` the first-registered model is used. The feature
    /// vector is validated before the model is looked up.
    pub fn predict(
        &self,
        features: &[f64],
        model_key: Option<&str>,
    ) -> Result<PredictionResult, PredictionError> {
        let normalized = self.registry.scaler().normalize(features)?;
        let model = self.resolve(model_key)?;

        let score = model
            .scorer()
            .score_probability(&normalized)
            .map_err(|e| PredictionError::ScoringFailed {
                model: model.key().to_string(),
                reason: format!("{:#}", e),
            })?;

        if !score.is_finite() {
            return Err(PredictionError::ScoringFailed {
                model: model.key().to_string(),
                reason: format!("non-finite probability {}", score),
            });
        }
        let probability = score.clamp(0.0, 1.0);

        let result = PredictionResult::from_probability(probability, model.key(), model.display_name());

        debug!(
            model = %model.key(),
            probability = result.probability,
            predicted_class = result.predicted_class,
            confidence = %result.confidence_band,
            "Prediction complete"
        );

        Ok(result)
    }

    /// Score several applicants independently with the same model selection
    pub fn predict_batch(
        &self,
        batch: &[Vec<f64>],
        model_key: Option<&str>,
    ) -> Vec<Result<PredictionResult, PredictionError>> {
        batch.iter().map(|f| self.predict(f, model_key)).collect()
    }

    fn resolve(&self, model_key: Option<&str>) -> Result<&ModelDescriptor, PredictionError> {
        match model_key {
            Some(key) => self
                .registry
                .get(key)
                .ok_or_else(|| PredictionError::UnknownModel {
                    requested: key.to_string(),
                    available: self.registry.keys(),
                }),
            None => self
                .registry
                .default_model()
                .ok_or(PredictionError::EmptyRegistry),
        }
    }
}
