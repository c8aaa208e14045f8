//! Assessment orchestration: predict, bucket, explain

use crate::config::AppConfig;
use crate::error::AssessmentError;
use crate::explain::{Explainer, SuggestionTable, PROFILE_STRONG_NOTE};
use crate::models::inference::Predictor;
use crate::models::loader::ModelLoader;
use crate::types::applicant::ApplicantRecord;
use crate::types::assessment::{Assessment, RiskBucket, RiskBucketThresholds};
use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scores applicants against a shared, load-once model.
///
/// Holds no mutable state; one instance serves every concurrent assessment.
pub struct CreditRiskAssessor {
    predictor: Arc<dyn Predictor>,
    explainer: Explainer,
    thresholds: RiskBucketThresholds,
}

impl CreditRiskAssessor {
    pub fn new(
        predictor: Arc<dyn Predictor>,
        explainer: Explainer,
        thresholds: RiskBucketThresholds,
    ) -> Self {
        Self {
            predictor,
            explainer,
            thresholds,
        }
    }

    /// Load the configured model artifact and build an assessor around it
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let predictor = loader
            .load(&config.model.artifact_path)
            .with_context(|| format!("Failed to load model from {}", config.model.artifact_path))?;

        info!(
            model = %predictor.name(),
            version = %predictor.version(),
            features = predictor.feature_names().len(),
            "Model loaded"
        );

        let explainer = Explainer::new(config.explanation.clone(), SuggestionTable::default());
        Ok(Self::new(
            Arc::new(predictor),
            explainer,
            config.risk.clone(),
        ))
    }

    pub fn predictor(&self) -> &Arc<dyn Predictor> {
        &self.predictor
    }

    pub fn thresholds(&self) -> &RiskBucketThresholds {
        &self.thresholds
    }

    /// Assess one applicant.
    ///
    /// Schema and inference failures abort the assessment. A failed
    /// explanation does not: PD and bucket are still returned, flagged as
    /// having no explanation.
    pub fn assess(
        &self,
        applicant_id: &str,
        record: &ApplicantRecord,
    ) -> Result<Assessment, AssessmentError> {
        let vector = self.predictor.transform(record)?;
        let pd = self.predictor.predict(&vector)?;
        let bucket = RiskBucket::from_pd(pd, &self.thresholds);

        debug!(applicant_id = %applicant_id, pd = pd, bucket = %bucket, "Applicant scored");

        let assessment = Assessment::new(applicant_id.to_string(), pd, bucket);
        let assessment =
            match self
                .explainer
                .explain_vector(&vector, self.predictor.importances(), pd)
            {
                Ok(explanation) if explanation.is_profile_strong() => {
                    assessment.with_note(true, PROFILE_STRONG_NOTE)
                }
                Ok(explanation) => assessment.with_contributions(explanation.into_contributions()),
                Err(e) => {
                    warn!(applicant_id = %applicant_id, error = %e, "Explanation unavailable");
                    assessment.with_note(false, format!("Risk reduction analysis unavailable: {e}"))
                }
            };

        Ok(assessment)
    }
}
