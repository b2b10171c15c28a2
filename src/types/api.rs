//! Request and response bodies of the HTTP interface

use super::prediction::{ConfidenceBand, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Raw applicant features, in training order
    pub features: Vec<f64>,

    /// Registry key of the model to use; the default model when absent
    #[serde(default, alias = "modelName")]
    pub model_name: Option<String>,
}

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Unique identifier for tracing this prediction in logs
    pub prediction_id: String,

    pub predicted_class: u8,

    pub probability: f64,

    pub confidence_band: ConfidenceBand,

    pub model_key: String,

    /// Display name of the model used
    pub model_used: String,

    pub recommendation: String,

    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn new(result: PredictionResult) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            predicted_class: result.predicted_class,
            probability: result.probability,
            confidence_band: result.confidence_band,
            model_key: result.model_key,
            model_used: result.model_display_name,
            recommendation: result.recommendation,
            timestamp: Utc::now(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    pub models_loaded: usize,
    pub available_models: Vec<String>,
}

/// Entry of `GET /models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub key: String,
    pub name: String,
}

/// Body of `GET /models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,

    /// Human-readable description
    pub detail: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_features: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_both_field_spellings() {
        let req: PredictionRequest =
            serde_json::from_str(r#"{"features": [1, 2.5], "model_name": "random_forest"}"#).unwrap();
        assert_eq!(req.features, vec![1.0, 2.5]);
        assert_eq!(req.model_name.as_deref(), Some("random_forest"));

        let req: PredictionRequest =
            serde_json::from_str(r#"{"features": [0.1], "modelName": "gradient_boosting"}"#).unwrap();
        assert_eq!(req.model_name.as_deref(), Some("gradient_boosting"));

        let req: PredictionRequest = serde_json::from_str(r#"{"features": []}"#).unwrap();
        assert!(req.model_name.is_none());
    }

    #[test]
    fn test_response_from_result() {
        let result = PredictionResult::from_probability(0.9, "logistic_regression", "Regressão Logística");
        let response = PredictionResponse::new(result);

        assert_eq!(response.model_used, "Regressão Logística");
        assert_eq!(response.model_key, "logistic_regression");
        assert_eq!(response.predicted_class, 1);
        assert!(uuid::Uuid::parse_str(&response.prediction_id).is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["confidence_band"], "high");
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let body = ErrorResponse {
            error: "empty_registry".to_string(),
            detail: "no models are loaded".to_string(),
            expected_features: None,
            available_models: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("expected_features").is_none());
        assert!(json.get("available_models").is_none());
    }
}
