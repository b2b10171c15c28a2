//! Type definitions for the credit approval service

pub mod api;
pub mod prediction;

pub use api::{ErrorResponse, HealthResponse, ModelInfo, ModelsResponse, PredictionRequest, PredictionResponse};
pub use prediction::{ConfidenceBand, Decision, PredictionResult};
