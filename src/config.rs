//! Configuration management for the credit approval service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServerConfig {
    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Model artifacts configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing model and scaler artifacts
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
    /// Scaler artifact file name inside `models_dir`
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Models to load, in registration order. The first one is the default.
    #[serde(default = "default_model_entries")]
    pub entries: Vec<ModelEntry>,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

/// One model to register
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub key: String,
    pub display_name: String,
    /// Artifact file name; defaults to `<key>.json`
    #[serde(default)]
    pub file: Option<String>,
}

impl ModelEntry {
    pub fn new(key: &str, display_name: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            file: None,
        }
    }

    pub fn artifact_file(&self) -> String {
        self.file
            .clone()
            .unwrap_or_else(|| format!("{}.json", self.key))
    }
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_model_entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new("logistic_regression", "Regressão Logística"),
        ModelEntry::new("random_forest", "Random Forest"),
        ModelEntry::new("gradient_boosting", "Gradient Boosting"),
    ]
}

fn default_onnx_threads() -> usize {
    1
}

impl ModelsConfig {
    pub fn scaler_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.scaler_file)
    }

    pub fn artifact_path(&self, entry: &ModelEntry) -> PathBuf {
        Path::new(&self.models_dir).join(entry.artifact_file())
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            scaler_file: default_scaler_file(),
            entries: default_model_entries(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `CREDIT_CONFIG` or the default path.
    ///
    /// A missing file is not an error: built-in defaults apply.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CREDIT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, then apply environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_sources(
            path.as_ref(),
            std::env::var("HOST").ok(),
            std::env::var("PORT").ok(),
        )
    }

    /// Layering: file, then `CREDIT__SECTION__KEY` variables, then plain HOST / PORT.
    fn from_sources(path: &Path, host: Option<String>, port: Option<String>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("CREDIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", host)?
            .set_override_option("server.port", port)?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            models: ModelsConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
