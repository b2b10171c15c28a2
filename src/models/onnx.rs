//! ONNX Runtime scorer for models exported with skl2onnx and similar tools.

use super::scorer::Scorer;
use crate::normalizer::NormalizedFeatures;
use anyhow::{anyhow, Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Model served through an ONNX Runtime session.
pub struct OnnxScorer {
    /// Session runs need exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxScorer {
    /// Load an ONNX model from file.
    pub fn load(path: &Path, intra_threads: usize) -> Result<Self> {
        ort::init().commit()?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(path)
            .with_context(|| format!("failed to load ONNX model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // Prefer the probability head over the label head
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| anyhow!("model has no output named '{}'", self.output_name))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_class_from_tensor(&dims, data);
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return positive_class_from_sequence_map(output);
        }

        Err(anyhow!(
            "unsupported output layout for '{}'",
            self.output_name
        ))
    }
}

/// Probability of class 1 from a `[batch, classes]` or `[classes]` tensor.
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    match classes {
        c if c >= 2 && data.len() >= 2 => Ok(data[1] as f64),
        1 if !data.is_empty() => Ok(data[0] as f64),
        _ => Err(anyhow!("probability tensor has shape {:?}", dims)),
    }
}

/// Probability of class 1 from a `seq(map(int64, float))` output.
fn positive_class_from_sequence_map(output: &DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("failed to downcast to sequence: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps.first().ok_or_else(|| anyhow!("empty probability sequence"))?;
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    positive_class_from_pairs(&pairs)
}

/// Probability of class 1 from `(class, probability)` pairs, falling back
/// to the complement of class 0.
fn positive_class_from_pairs(pairs: &[(i64, f32)]) -> Result<f64> {
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(*p as f64);
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *p as f64);
    }
    Err(anyhow!("no class probabilities in map output"))
}

impl Scorer for OnnxScorer {
    fn family(&self) -> &'static str {
        "onnx"
    }

    fn feature_count(&self) -> Option<usize> {
        None
    }

    fn score_probability(&self, features: &NormalizedFeatures) -> Result<f64> {
        let input: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, input.len() as i64];
        let tensor = Tensor::from_array((shape, input)).context("failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("session lock poisoned: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;

        let probability = self.extract_probability(&outputs)?;
        debug!(probability, "ONNX inference complete");
        Ok(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_class_from_tensor() {
        assert_eq!(positive_class_from_tensor(&[1, 2], &[0.25, 0.75]).unwrap(), 0.75);
        assert_eq!(positive_class_from_tensor(&[1, 1], &[0.4]).unwrap(), 0.4f32 as f64);
        assert!(positive_class_from_tensor(&[1, 0], &[]).is_err());
    }

    #[test]
    fn test_positive_class_from_pairs() {
        assert_eq!(positive_class_from_pairs(&[(0, 0.25), (1, 0.75)]).unwrap(), 0.75);
        assert_eq!(positive_class_from_pairs(&[(1, 0.5), (0, 0.5)]).unwrap(), 0.5);
        assert_eq!(positive_class_from_pairs(&[(0, 0.25)]).unwrap(), 0.75);
        assert!(positive_class_from_pairs(&[]).is_err());
        assert!(positive_class_from_pairs(&[(2, 0.9)]).is_err());
    }

    #[test]
    fn test_load_rejects_non_onnx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a protobuf graph").unwrap();

        assert!(OnnxScorer::load(&path, 1).is_err());
    }
}
