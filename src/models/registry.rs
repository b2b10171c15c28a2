//! Read-only registry of loaded models.
//!
//! Built once at startup and never mutated afterwards, so it can be shared
//! across request handlers behind an `Arc` without locking.

use super::loader::ModelLoader;
use super::scorer::Scorer;
use crate::config::ModelsConfig;
use crate::error::ArtifactError;
use crate::normalizer::StandardScaler;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// A loaded model and its metadata
pub struct ModelDescriptor {
    key: String,
    display_name: String,
    scorer: Box<dyn Scorer>,
}

impl ModelDescriptor {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, scorer: Box<dyn Scorer>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            scorer,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("family", &self.scorer.family())
            .finish()
    }
}

/// Models keyed by name, in registration order, plus the shared scaler
#[derive(Debug)]
pub struct ModelRegistry {
    scaler: StandardScaler,
    models: Vec<ModelDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Assemble a registry from already-loaded parts.
    ///
    /// Registration order is the order of `models`; the first entry is the
    /// default model.
    pub fn new(scaler: StandardScaler, models: Vec<ModelDescriptor>) -> Result<Self, ArtifactError> {
        let mut index = HashMap::with_capacity(models.len());

        for (position, model) in models.iter().enumerate() {
            if index.insert(model.key.clone(), position).is_some() {
                return Err(ArtifactError::DuplicateKey(model.key.clone()));
            }
            if let Some(model_features) = model.scorer.feature_count() {
                if model_features != scaler.feature_count() {
                    return Err(ArtifactError::ArityMismatch {
                        model: model.key.clone(),
                        model_features,
                        normalizer_features: scaler.feature_count(),
                    });
                }
            }
        }

        Ok(Self {
            scaler,
            models,
            index,
        })
    }

    /// Load the scaler and every configured model.
    ///
    /// Fails on the first missing or corrupt artifact.
    pub fn load_all(config: &ModelsConfig) -> Result<Self, ArtifactError> {
        let loader = ModelLoader::with_threads(config.onnx_threads);
        let scaler = loader.load_scaler(&config.scaler_path())?;

        let mut models = Vec::with_capacity(config.entries.len());
        for entry in &config.entries {
            let scorer = loader.load_model(&config.artifact_path(entry), &entry.key)?;
            models.push(ModelDescriptor::new(&entry.key, &entry.display_name, scorer));
        }

        let registry = Self::new(scaler, models)?;
        info!(
            count = registry.count(),
            models_dir = %config.models_dir,
            "Loaded {} models",
            registry.count()
        );
        Ok(registry)
    }

    pub fn get(&self, key: &str) -> Option<&ModelDescriptor> {
        self.index.get(key).map(|&i| &self.models[i])
    }

    /// Models in registration order
    pub fn list_all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn keys(&self) -> Vec<String> {
        self.models.iter().map(|m| m.key.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.models.len()
    }

    /// The first-registered model, used when a request names none
    pub fn default_model(&self) -> Option<&ModelDescriptor> {
        self.models.first()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelEntry;
    use crate::models::scorer::LogisticRegression;
    use std::fs;

    fn scaler(n: usize) -> StandardScaler {
        StandardScaler::new(vec![0.0; n], vec![1.0; n]).unwrap()
    }

    fn lr(key: &str, n: usize) -> ModelDescriptor {
        ModelDescriptor::new(key, key.to_uppercase(), Box::new(LogisticRegression::new(vec![0.5; n], 0.0)))
    }

    #[test]
    fn test_lookup_and_order() {
        let registry = ModelRegistry::new(scaler(2), vec![lr("b", 2), lr("a", 2), lr("c", 2)]).unwrap();

        assert_eq!(registry.count(), 3);
        assert_eq!(registry.keys(), vec!["b", "a", "c"]);
        assert_eq!(registry.default_model().unwrap().key(), "b");
        assert_eq!(registry.get("a").unwrap().display_name(), "A");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = ModelRegistry::new(scaler(2), vec![lr("a", 2), lr("a", 2)]).unwrap_err();
        assert!(matches!(err, ArtifactError::DuplicateKey(ref k) if k == "a"));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let err = ModelRegistry::new(scaler(3), vec![lr("a", 2)]).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::ArityMismatch {
                model_features: 2,
                normalizer_features: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModelRegistry::new(scaler(1), vec![]).unwrap();
        assert_eq!(registry.count(), 0);
        assert!(registry.default_model().is_none());
    }

    #[test]
    fn test_load_all_fails_on_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scaler.json"), r#"{"mean": [0.0], "scale": [1.0]}"#).unwrap();
        fs::write(
            dir.path().join("first.json"),
            r#"{"kind": "logistic_regression", "n_features": 1, "coefficients": [1.0], "intercept": 0.0}"#,
        )
        .unwrap();

        let mut config = ModelsConfig {
            models_dir: dir.path().to_string_lossy().into_owned(),
            entries: vec![ModelEntry::new("first", "First")],
            ..ModelsConfig::default()
        };
        let registry = ModelRegistry::load_all(&config).unwrap();
        assert_eq!(registry.keys(), vec!["first"]);

        config.entries.push(ModelEntry::new("second", "Second"));
        let err = ModelRegistry::load_all(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
    }

    #[test]
    fn test_load_all_fails_without_scaler() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelsConfig {
            models_dir: dir.path().to_string_lossy().into_owned(),
            ..ModelsConfig::default()
        };
        let err = ModelRegistry::load_all(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { ref path } if path.ends_with("scaler.json")));
    }
}
