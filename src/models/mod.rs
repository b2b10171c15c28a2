//! Model artifacts, registry and inference

pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;
pub mod scorer;
pub mod tree;

pub use inference::PredictionEngine;
pub use loader::ModelLoader;
pub use registry::{ModelDescriptor, ModelRegistry};
pub use scorer::Scorer;
