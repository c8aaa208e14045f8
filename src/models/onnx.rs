//! ONNX Runtime model stage
//!
//! Runs an exported classifier on the transformed feature vector. Handles
//! both tensor probability outputs and the seq(map(int64, float)) outputs
//! some converters emit.

use crate::error::{AssessmentError, ModelError};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Loaded ONNX session with its I/O names
pub struct OnnxModel {
    /// Session runs need exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: usize,
}

impl OnnxModel {
    /// Load a model file with the given intra-op thread count
    pub fn load(path: &Path, n_features: usize, threads: usize) -> Result<Self, ModelError> {
        ort::init().commit()?;
        info!(path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(input = %input_name, output = %output_name, "ONNX model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Positive-class probability for one transformed vector
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, AssessmentError> {
        let inference = |e: ort::Error| AssessmentError::Inference(e.to_string());

        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_array((vec![1_i64, features.len() as i64], data))
            .map_err(inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| AssessmentError::Inference(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(inference)?;

        self.extract_probability(&outputs)
    }

    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64, AssessmentError> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(prob) = probability_from(output) {
                return Ok(prob);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = probability_from(&output) {
                debug!(output = %name, "Probability taken from fallback output");
                return Ok(prob);
            }
        }

        Err(AssessmentError::Inference(
            "model produced no probability output".to_string(),
        ))
    }
}

fn probability_from(output: &ort::value::DynValue) -> Option<f64> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let classes = shape.iter().last().copied().unwrap_or(1);
        let prob = class_probability(data, classes)?;
        debug!(prob = prob, "Extracted probability from tensor output");
        return Some(prob);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return extract_from_sequence_map(output).ok();
    }
    None
}

/// Positive-class probability from a flat tensor with `classes` columns
fn class_probability(data: &[f32], classes: i64) -> Option<f64> {
    let index = if classes >= 2 { 1 } else { 0 };
    data.get(index).map(|&p| p as f64)
}

/// Class-1 probability from a seq(map(int64, float)) output
fn extract_from_sequence_map(output: &ort::value::DynValue) -> Result<f64, AssessmentError> {
    let failed = |e: ort::Error| AssessmentError::Inference(e.to_string());
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(failed)?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(failed)?;
    let first = maps
        .first()
        .ok_or_else(|| AssessmentError::Inference("empty probability sequence".to_string()))?;
    let pairs = first.try_extract_key_values::<i64, f32>().map_err(failed)?;

    if let Some((_, prob)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *prob as f64);
    }
    Err(AssessmentError::Inference(
        "no class probability in output map".to_string(),
    ))
}
