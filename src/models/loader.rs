//! Model artifact loader

use crate::error::ModelError;
use crate::models::forest::{DecisionTree, EnsembleKind, TreeEnsemble};
use crate::models::inference::{ModelStage, PipelinePredictor};
use crate::preprocess::{FeaturePreprocessor, PreprocessSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Serialized fitted pipeline: preprocessing parameters plus the model stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Model name
    pub name: String,
    /// Artifact version, reported with every load
    #[serde(default)]
    pub version: String,
    pub preprocess: PreprocessSpec,
    pub model: ModelSpec,
}

/// Model stage of the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    RandomForest {
        n_features: usize,
        /// Global importances; derived from node impurity when absent
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
        trees: Vec<DecisionTree>,
    },
    GradientBoosting {
        n_features: usize,
        #[serde(default)]
        feature_importances: Option<Vec<f64>>,
        /// Initial raw score (log-odds)
        #[serde(default)]
        base_score: f64,
        learning_rate: f64,
        trees: Vec<DecisionTree>,
    },
    Onnx {
        n_features: usize,
        feature_importances: Vec<f64>,
        /// ONNX file, relative to the artifact's directory
        path: PathBuf,
    },
}

impl ModelSpec {
    fn n_features(&self) -> usize {
        match self {
            ModelSpec::RandomForest { n_features, .. }
            | ModelSpec::GradientBoosting { n_features, .. }
            | ModelSpec::Onnx { n_features, .. } => *n_features,
        }
    }
}

/// Loader for fitted pipeline artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with the given ONNX intra-op thread count
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load an artifact from a JSON file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<PipelinePredictor, ModelError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");

        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.load_from_str(&json, base_dir)
    }

    /// Load an artifact from JSON text, resolving relative model files against `base_dir`
    pub fn load_from_str(
        &self,
        json: &str,
        base_dir: &Path,
    ) -> Result<PipelinePredictor, ModelError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        self.build(artifact, base_dir)
    }

    /// Validate an artifact and assemble the predictor
    pub fn build(
        &self,
        artifact: ModelArtifact,
        base_dir: &Path,
    ) -> Result<PipelinePredictor, ModelError> {
        let preprocessor = FeaturePreprocessor::new(artifact.preprocess)?;
        let n_features = artifact.model.n_features();

        if preprocessor.feature_count() != n_features {
            return Err(ModelError::Invalid(format!(
                "preprocessing emits {} features but the model expects {}",
                preprocessor.feature_count(),
                n_features
            )));
        }

        let (stage, importances) = match artifact.model {
            ModelSpec::RandomForest {
                n_features,
                feature_importances,
                trees,
            } => {
                let ensemble = TreeEnsemble::new(EnsembleKind::RandomForest, trees, n_features)?;
                debug!(trees = ensemble.tree_count(), "Random forest stage built");
                let importances = resolve_importances(&ensemble, feature_importances)?;
                (ModelStage::Trees(ensemble), importances)
            }
            ModelSpec::GradientBoosting {
                n_features,
                feature_importances,
                base_score,
                learning_rate,
                trees,
            } => {
                let kind = EnsembleKind::GradientBoosting {
                    base_score,
                    learning_rate,
                };
                let ensemble = TreeEnsemble::new(kind, trees, n_features)?;
                debug!(trees = ensemble.tree_count(), "Gradient boosting stage built");
                let importances = resolve_importances(&ensemble, feature_importances)?;
                (ModelStage::Trees(ensemble), importances)
            }
            ModelSpec::Onnx {
                n_features,
                feature_importances,
                path,
            } => {
                let path = base_dir.join(path);
                (self.load_onnx(&path, n_features)?, feature_importances)
            }
        };

        validate_importances(&importances, n_features)?;
        // -0.0 passes validation; store it as +0.0
        let importances: Vec<f64> = importances.into_iter().map(f64::abs).collect();

        let predictor =
            PipelinePredictor::new(artifact.name, artifact.version, preprocessor, stage, importances);
        info!(
            model = %predictor.name(),
            version = %predictor.version(),
            features = n_features,
            "Model artifact loaded successfully"
        );
        Ok(predictor)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path, n_features: usize) -> Result<ModelStage, ModelError> {
        let model = crate::models::onnx::OnnxModel::load(path, n_features, self.onnx_threads)?;
        Ok(ModelStage::Onnx(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path, _n_features: usize) -> Result<ModelStage, ModelError> {
        warn!(
            path = %path.display(),
            threads = self.onnx_threads,
            "Artifact uses an ONNX model stage but ONNX support is not compiled in"
        );
        Err(ModelError::Unsupported("onnx".to_string()))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_importances(
    ensemble: &TreeEnsemble,
    listed: Option<Vec<f64>>,
) -> Result<Vec<f64>, ModelError> {
    if let Some(importances) = listed {
        return Ok(importances);
    }
    warn!("Artifact lists no feature importances, deriving them from node impurity");
    ensemble.impurity_importances().ok_or_else(|| {
        ModelError::Invalid(
            "feature_importances missing and trees carry no impurity statistics".to_string(),
        )
    })
}

fn validate_importances(importances: &[f64], n_features: usize) -> Result<(), ModelError> {
    if importances.len() != n_features {
        return Err(ModelError::Invalid(format!(
            "{} feature importances listed for {} features",
            importances.len(),
            n_features
        )));
    }
    if let Some((index, value)) = importances
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(ModelError::Invalid(format!(
            "feature importance {value} at index {index} is negative or not finite"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) const BUNDLED_MODEL: &str = include_str!("../../models/credit_risk_model.json");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::Predictor;

    fn bundled() -> ModelArtifact {
        serde_json::from_str(BUNDLED_MODEL).unwrap()
    }

    #[test]
    fn test_load_bundled_model() {
        let predictor = ModelLoader::new()
            .load_from_str(BUNDLED_MODEL, Path::new("."))
            .unwrap();

        assert_eq!(predictor.name(), "credit_risk_rf");
        assert_eq!(predictor.feature_names().len(), 26);
        assert_eq!(predictor.importances().len(), 26);
        assert_eq!(predictor.feature_names()[0], "num__person_age");
        assert_eq!(predictor.feature_names()[25], "cat__cb_person_default_on_file_Y");
    }

    #[test]
    fn test_derived_importances_match_listed() {
        let artifact = bundled();
        let listed = match &artifact.model {
            ModelSpec::RandomForest {
                feature_importances,
                ..
            } => feature_importances.clone().unwrap(),
            _ => unreachable!(),
        };

        let mut unlisted = artifact;
        if let ModelSpec::RandomForest {
            feature_importances,
            ..
        } = &mut unlisted.model
        {
            *feature_importances = None;
        }
        let predictor = ModelLoader::new().build(unlisted, Path::new(".")).unwrap();

        for (derived, listed) in predictor.importances().iter().zip(&listed) {
            assert!((derived - listed).abs() < 1e-6, "{derived} vs {listed}");
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut artifact = bundled();
        artifact.preprocess.categorical.pop();
        let err = ModelLoader::new().build(artifact, Path::new(".")).unwrap_err();
        assert!(matches!(err, ModelError::Invalid(msg) if msg.contains("24 features")));
    }

    #[test]
    fn test_negative_importance_rejected() {
        let mut artifact = bundled();
        if let ModelSpec::RandomForest {
            feature_importances: Some(importances),
            ..
        } = &mut artifact.model
        {
            importances[3] = -0.1;
        }
        assert!(ModelLoader::new().build(artifact, Path::new(".")).is_err());
    }

    #[test]
    fn test_negative_zero_importance_stored_positive() {
        let mut artifact = bundled();
        if let ModelSpec::RandomForest {
            feature_importances: Some(importances),
            ..
        } = &mut artifact.model
        {
            importances[0] = -0.0;
        }
        let predictor = ModelLoader::new().build(artifact, Path::new(".")).unwrap();
        assert!(predictor.importances()[0].is_sign_positive());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ModelLoader::new().load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_stage_needs_feature() {
        let json = r#"{
            "name": "exported",
            "preprocess": { "numeric": [{ "column": "person_age" }] },
            "model": { "kind": "onnx", "n_features": 1, "feature_importances": [1.0], "path": "model.onnx" }
        }"#;
        let err = ModelLoader::new().load_from_str(json, Path::new(".")).unwrap_err();
        assert!(matches!(err, ModelError::Unsupported(_)));
    }
}
