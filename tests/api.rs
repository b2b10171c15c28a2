//! End-to-end tests of the HTTP interface over the shipped sample artifacts.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use credit_approval_service::config::ModelsConfig;
use credit_approval_service::server::{router, AppState};
use credit_approval_service::{ModelRegistry, PredictionEngine, ServingMetrics, StandardScaler};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn shipped_models() -> ModelsConfig {
    ModelsConfig {
        models_dir: Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("models")
            .to_string_lossy()
            .into_owned(),
        ..ModelsConfig::default()
    }
}

fn app_with(engine: PredictionEngine) -> (Router, Arc<ServingMetrics>) {
    let metrics = Arc::new(ServingMetrics::new());
    let state = AppState::new(Arc::new(engine), metrics.clone());
    (router(state), metrics)
}

fn app() -> Router {
    app_with(PredictionEngine::from_config(&shipped_models()).unwrap()).0
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_loaded_models() {
    let (status, body) = send(app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models_loaded"], 3);
    assert_eq!(
        body["available_models"],
        json!(["logistic_regression", "random_forest", "gradient_boosting"])
    );
}

#[tokio::test]
async fn models_lists_keys_and_names_in_order() {
    let (status, body) = send(app(), Method::GET, "/models", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["models"],
        json!([
            {"key": "logistic_regression", "name": "Regressão Logística"},
            {"key": "random_forest", "name": "Random Forest"},
            {"key": "gradient_boosting", "name": "Gradient Boosting"}
        ])
    );
}

#[tokio::test]
async fn predict_with_default_model() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.5, 1.2, -0.3, 2.1, 0.8, 1.5]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_key"], "logistic_regression");
    assert_eq!(body["model_used"], "Regressão Logística");
    assert_eq!(body["predicted_class"], 1);
    assert_eq!(body["confidence_band"], "medium");
    assert_eq!(body["recommendation"], "Aprovação recomendada com ressalvas");
    let probability = body["probability"].as_f64().unwrap();
    assert!((probability - 0.743463).abs() < 1e-5);
    assert!(body["prediction_id"].is_string());
}

#[tokio::test]
async fn predict_with_named_model() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.5, 1.2, -0.3, 2.1, 0.8, 1.5], "modelName": "random_forest"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "Random Forest");
    assert!((body["probability"].as_f64().unwrap() - 0.605).abs() < 1e-9);
}

#[tokio::test]
async fn short_feature_vector_is_rejected() {
    for model in [None, Some("random_forest"), Some("gradient_boosting")] {
        let mut request = json!({"features": [0.5, 1.2, -0.3, 2.1, 0.8]});
        if let Some(model) = model {
            request["model_name"] = json!(model);
        }

        let (status, body) = send(app(), Method::POST, "/predict", Some(request)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "schema_mismatch");
        assert_eq!(body["expected_features"], 6);
    }
}

#[tokio::test]
async fn short_vector_with_unknown_model_is_a_schema_error() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.5, 1.2, -0.3, 2.1, 0.8], "modelName": "nonexistent"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "schema_mismatch");
    assert_eq!(body["expected_features"], 6);
}

#[tokio::test]
async fn overflowing_features_are_rejected() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": [-1.7e308, 0.0, 0.0, 0.0, 1.7e308, 0.0]})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_feature");
}

#[tokio::test]
async fn unknown_model_is_rejected() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.5, 1.2, -0.3, 2.1, 0.8, 1.5], "model_name": "nonexistent"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_model");
    assert_eq!(body["available_models"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn empty_registry_is_a_server_error() {
    let scaler = StandardScaler::new(vec![0.0; 6], vec![1.0; 6]).unwrap();
    let engine = PredictionEngine::new(ModelRegistry::new(scaler, vec![]).unwrap());
    let (app, _) = app_with(engine);

    let (status, body) = send(
        app,
        Method::POST,
        "/predict",
        Some(json!({"features": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "empty_registry");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/predict",
        Some(json!({"features": "not a list"})),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn metrics_count_outcomes() {
    let (app, metrics) = app_with(PredictionEngine::from_config(&shipped_models()).unwrap());

    send(
        app.clone(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]})),
    )
    .await;
    send(
        app.clone(),
        Method::POST,
        "/predict",
        Some(json!({"features": [0.0], "model_name": "random_forest"})),
    )
    .await;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.predictions_served, 1);
    assert_eq!(snapshot.requests_rejected, 1);
    assert_eq!(snapshot.rejections["schema_mismatch"], 1);

    let (status, body) = send(app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions_served"], 1);
    assert_eq!(body["by_model"]["logistic_regression"], 1);
}
