//! HTTP interface: health, model listing, prediction and metrics endpoints.

use crate::config::ServerConfig;
use crate::error::PredictionError;
use crate::metrics::{MetricsSnapshot, ServingMetrics};
use crate::models::inference::PredictionEngine;
use crate::types::api::{
    ErrorResponse, HealthResponse, ModelInfo, ModelsResponse, PredictionRequest, PredictionResponse,
};
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PredictionEngine>,
    pub metrics: Arc<ServingMetrics>,
}

impl AppState {
    pub fn new(engine: Arc<PredictionEngine>, metrics: Arc<ServingMetrics>) -> Self {
        Self { engine, metrics }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Listening for HTTP requests");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.engine.registry();
    Json(HealthResponse {
        message: "API funcionando".to_string(),
        models_loaded: registry.count(),
        available_models: registry.keys(),
    })
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = state
        .engine
        .registry()
        .list_all()
        .iter()
        .map(|m| ModelInfo {
            key: m.key().to_string(),
            name: m.display_name().to_string(),
        })
        .collect();
    Json(ModelsResponse { models })
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        state.metrics.record_rejection("invalid_request");
        ApiError::Rejected(rejection)
    })?;

    let started = Instant::now();
    match state
        .engine
        .predict(&request.features, request.model_name.as_deref())
    {
        Ok(result) => {
            state.metrics.record_prediction(
                &result.model_key,
                result.confidence_band,
                result.predicted_class == 1,
                started.elapsed(),
            );
            let response = PredictionResponse::new(result);
            info!(
                prediction_id = %response.prediction_id,
                model = %response.model_key,
                probability = response.probability,
                confidence = %response.confidence_band,
                "Prediction served"
            );
            Ok(Json(response))
        }
        Err(error) => {
            state.metrics.record_rejection(error.kind());
            if error.is_client_error() {
                warn!(error = %error, "Prediction request rejected");
            } else {
                tracing::error!(error = %error, "Prediction failed");
            }
            Err(ApiError::Prediction {
                error,
                expected_features: state.engine.feature_count(),
            })
        }
    }
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Error returned by a handler, rendered as an [`ErrorResponse`]
#[derive(Debug)]
pub enum ApiError {
    /// Body could not be decoded
    Rejected(JsonRejection),
    /// Engine refused or failed the prediction
    Prediction {
        error: PredictionError,
        expected_features: usize,
    },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejected(rejection) => rejection.status(),
            ApiError::Prediction { error, .. } => match error {
                PredictionError::SchemaMismatch { .. } | PredictionError::InvalidFeature { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                PredictionError::UnknownModel { .. } => StatusCode::NOT_FOUND,
                PredictionError::EmptyRegistry => StatusCode::SERVICE_UNAVAILABLE,
                PredictionError::ScoringFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Rejected(rejection) => ErrorResponse {
                error: "invalid_request".to_string(),
                detail: rejection.body_text(),
                expected_features: None,
                available_models: None,
            },
            ApiError::Prediction {
                error,
                expected_features,
            } => ErrorResponse {
                error: error.kind().to_string(),
                detail: error.to_string(),
                expected_features: match error {
                    PredictionError::SchemaMismatch { .. } | PredictionError::InvalidFeature { .. } => {
                        Some(*expected_features)
                    }
                    _ => None,
                },
                available_models: match error {
                    PredictionError::UnknownModel { available, .. } => Some(available.clone()),
                    _ => None,
                },
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
