//! Feature normalization applied before model inference.
//!
//! Models were trained on standardized inputs, so every raw feature vector
//! passes through the same fitted scaler before scoring. The scaler's
//! parameters come from the persisted artifact and are never refitted.

use crate::error::PredictionError;
use serde::Deserialize;

/// Feature vector that has been through the fitted scaler.
///
/// Only [`StandardScaler::normalize`] can build one, so a scorer can never
/// receive raw, unscaled input.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatures(Vec<f64>);

impl NormalizedFeatures {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fitted standard scaler: `(x - mean) / scale` per feature.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters.
    ///
    /// Returns a description of the problem when the parameters cannot
    /// describe a usable transform.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check parameters deserialized from an artifact.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(format!("mean[{}] is not finite", i));
        }
        if let Some(i) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(format!("scale[{}] must be finite and non-zero", i));
        }
        Ok(())
    }

    /// Number of features the scaler was fitted on.
    pub fn feature_count(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a raw feature vector.
    pub fn normalize(&self, features: &[f64]) -> Result<NormalizedFeatures, PredictionError> {
        if features.len() != self.feature_count() {
            return Err(PredictionError::SchemaMismatch {
                expected: self.feature_count(),
                actual: features.len(),
            });
        }

        if let Some((index, &value)) = features.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PredictionError::InvalidFeature { index, value });
        }

        let scaled: Vec<f64> = features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect();

        // Finite inputs can still overflow once scaled
        if let Some(index) = scaled.iter().position(|v| !v.is_finite()) {
            return Err(PredictionError::InvalidFeature {
                index,
                value: features[index],
            });
        }

        Ok(NormalizedFeatures(scaled))
    }
}
