//! Predictor interface and the fitted-pipeline predictor

use crate::error::AssessmentError;
use crate::models::forest::TreeEnsemble;
use crate::preprocess::{FeaturePreprocessor, TransformedFeatureVector};
use crate::types::applicant::ApplicantRecord;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Everything the explanation engine needs from a fitted pipeline.
///
/// Implementations are shared read-only across concurrent assessments.
pub trait Predictor: Send + Sync {
    /// Apply the preprocessing stage only.
    fn transform(&self, record: &ApplicantRecord)
        -> Result<TransformedFeatureVector, AssessmentError>;

    /// Apply the model stage, returning the probability of default.
    fn predict(&self, vector: &TransformedFeatureVector) -> Result<f64, AssessmentError>;

    /// Transformed feature names; the same order on every call.
    fn feature_names(&self) -> &[String];

    /// Global per-feature importances, aligned with `feature_names()`.
    fn importances(&self) -> &[f64];
}

/// Executable model stage of a pipeline
pub(crate) enum ModelStage {
    Trees(TreeEnsemble),
    #[cfg(feature = "onnx")]
    Onnx(crate::models::onnx::OnnxModel),
}

impl ModelStage {
    fn n_features(&self) -> usize {
        match self {
            ModelStage::Trees(ensemble) => ensemble.n_features(),
            #[cfg(feature = "onnx")]
            ModelStage::Onnx(model) => model.n_features(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ModelStage::Trees(_) => "trees",
            #[cfg(feature = "onnx")]
            ModelStage::Onnx(_) => "onnx",
        }
    }
}

/// Fitted preprocessing + model pipeline loaded from an artifact
pub struct PipelinePredictor {
    name: String,
    version: String,
    preprocessor: FeaturePreprocessor,
    stage: ModelStage,
    importances: Vec<f64>,
}

impl PipelinePredictor {
    pub(crate) fn new(
        name: String,
        version: String,
        preprocessor: FeaturePreprocessor,
        stage: ModelStage,
        importances: Vec<f64>,
    ) -> Self {
        Self {
            name,
            version,
            preprocessor,
            stage,
            importances,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Transform and predict in one step
    pub fn predict_record(&self, record: &ApplicantRecord) -> Result<f64, AssessmentError> {
        let vector = self.transform(record)?;
        self.predict(&vector)
    }
}

impl fmt::Debug for PipelinePredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelinePredictor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("stage", &self.stage.kind())
            .field("features", &self.preprocessor.feature_count())
            .finish()
    }
}

impl Predictor for PipelinePredictor {
    fn transform(
        &self,
        record: &ApplicantRecord,
    ) -> Result<TransformedFeatureVector, AssessmentError> {
        self.preprocessor.transform(record)
    }

    fn predict(&self, vector: &TransformedFeatureVector) -> Result<f64, AssessmentError> {
        let expected = self.stage.n_features();
        if vector.len() != expected {
            return Err(AssessmentError::Inference(format!(
                "feature vector has {} values, model was fitted on {}",
                vector.len(),
                expected
            )));
        }
        let own_names = self.preprocessor.feature_names();
        if !Arc::ptr_eq(vector.shared_names(), own_names) && vector.names() != &own_names[..] {
            return Err(AssessmentError::Inference(
                "feature vector was produced by a different pipeline".to_string(),
            ));
        }

        let pd = match &self.stage {
            ModelStage::Trees(ensemble) => ensemble.predict_proba(vector.values()),
            #[cfg(feature = "onnx")]
            ModelStage::Onnx(model) => model.predict_proba(vector.values())?,
        };

        if !(0.0..=1.0).contains(&pd) {
            return Err(AssessmentError::Inference(format!(
                "model produced probability {pd} outside [0, 1]"
            )));
        }

        debug!(model = %self.name, stage = self.stage.kind(), pd = pd, "Model inference complete");
        Ok(pd)
    }

    fn feature_names(&self) -> &[String] {
        self.preprocessor.feature_names()
    }

    fn importances(&self) -> &[f64] {
        &self.importances
    }
}
