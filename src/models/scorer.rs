//! Scoring capability shared by every model family.

use crate::normalizer::NormalizedFeatures;
use anyhow::Result;
use serde::Deserialize;

/// A fitted classifier that yields the probability of the approved class.
///
/// Implementations are immutable after loading and are shared across
/// concurrent requests.
pub trait Scorer: Send + Sync {
    /// Algorithm family, for logging.
    fn family(&self) -> &'static str;

    /// Number of input features the model was fitted on, when known.
    fn feature_count(&self) -> Option<usize>;

    /// Probability of the positive ("approved") class.
    fn score_probability(&self, features: &NormalizedFeatures) -> Result<f64>;
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Binary logistic regression: `sigmoid(w · x + b)`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    n_features: usize,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            n_features: coefficients.len(),
            coefficients,
            intercept,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.coefficients.len() != self.n_features {
            return Err(format!(
                "declares {} features but has {} coefficients",
                self.n_features,
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err("coefficients must be finite".to_string());
        }
        Ok(())
    }
}

impl Scorer for LogisticRegression {
    fn family(&self) -> &'static str {
        "logistic_regression"
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn score_probability(&self, features: &NormalizedFeatures) -> Result<f64> {
        let z: f64 = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(sigmoid(z))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::normalizer::StandardScaler;

    /// Pass raw values through an identity scaler.
    pub(crate) fn identity(values: &[f64]) -> NormalizedFeatures {
        StandardScaler::new(vec![0.0; values.len()], vec![1.0; values.len()])
            .unwrap()
            .normalize(values)
            .unwrap()
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_logistic_regression_score() {
        let model = LogisticRegression::new(vec![1.0, -2.0], 0.5);
        let p = model.score_probability(&identity(&[1.0, 0.25])).unwrap();
        // z = 1.0 - 0.5 + 0.5 = 1.0
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
        assert_eq!(model.feature_count(), Some(2));
    }

    #[test]
    fn test_logistic_regression_validation() {
        let model: LogisticRegression = serde_json::from_str(
            r#"{"n_features": 3, "coefficients": [0.1, 0.2], "intercept": 0.0}"#,
        )
        .unwrap();
        assert!(model.validate().is_err());

        assert!(LogisticRegression::new(vec![0.1, 0.2], 0.0).validate().is_ok());
    }
}
