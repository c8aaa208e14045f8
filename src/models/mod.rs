//! Fitted model components: artifact loading, tree ensembles and inference

pub mod forest;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use forest::{DecisionTree, TreeEnsemble};
pub use inference::{PipelinePredictor, Predictor};
pub use loader::{ModelArtifact, ModelLoader};
