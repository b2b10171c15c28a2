//! Credit Approval Service Library
//!
//! Serves credit-approval predictions from several pre-trained models:
//! a read-only model registry, mandatory feature normalization, scoring and
//! post-processing into a decision, confidence band and recommendation.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{ArtifactError, PredictionError};
pub use metrics::ServingMetrics;
pub use models::inference::PredictionEngine;
pub use models::registry::{ModelDescriptor, ModelRegistry};
pub use normalizer::StandardScaler;
pub use types::prediction::{ConfidenceBand, PredictionResult};
