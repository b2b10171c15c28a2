//! Credit Approval Service - Main Entry Point
//!
//! Loads every configured model artifact, then serves predictions over HTTP.
//! Startup aborts with a non-zero exit code if any artifact fails to load.

use anyhow::{Context, Result};
use credit_approval_service::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServingMetrics},
    models::inference::PredictionEngine,
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;
    info!("Starting Credit Approval Service");
    info!(
        models_dir = %config.models.models_dir,
        models = config.models.entries.len(),
        "Configuration loaded successfully"
    );

    // Load artifacts before accepting traffic
    let engine = PredictionEngine::from_config(&config.models)
        .context("Failed to load model artifacts")?;
    let registry = engine.registry();
    if registry.count() == 0 {
        warn!("No models configured; predictions without a model will fail");
    }
    info!(
        models = ?registry.keys(),
        features = engine.feature_count(),
        "Models ready: {}",
        registry.count()
    );

    let metrics = Arc::new(ServingMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(Arc::new(engine), metrics.clone());
    server::serve(&config.server, state).await?;

    info!("Service shutting down...");
    metrics.log_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "credit_approval_service={level},tower_http={level}",
            level = logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
