//! Credit Risk Assessment Library
//!
//! Scores a loan applicant's probability of default with a fitted
//! tree-ensemble pipeline, buckets the result into a risk tier and
//! explains which features drive the predicted probability.

pub mod assessment;
pub mod config;
pub mod consumer;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod models;
pub mod preprocess;
pub mod producer;
pub mod types;

pub use assessment::CreditRiskAssessor;
pub use config::AppConfig;
pub use consumer::ApplicationConsumer;
pub use error::{AssessmentError, AttributionError, ModelError};
pub use explain::{Explainer, Explanation};
pub use models::inference::{PipelinePredictor, Predictor};
pub use preprocess::{FeaturePreprocessor, TransformedFeatureVector};
pub use producer::AssessmentPublisher;
pub use types::{
    applicant::{ApplicantRecord, ApplicationRequest},
    assessment::{Assessment, ContributionEntry, RiskBucket},
};
