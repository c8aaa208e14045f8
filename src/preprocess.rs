//! Fitted preprocessing stage of the credit risk pipeline.
//!
//! Turns an [`ApplicantRecord`] into the numeric vector the model stage was
//! trained on. Numeric columns come first (`num__<column>`, standard-scaled),
//! followed by one-hot dummies for each categorical column
//! (`cat__<column>_<category>`) in the fitted category order.

use crate::error::{AssessmentError, AttributionError, ModelError};
use crate::types::applicant::ApplicantRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name prefix of scaled numeric features
pub const NUMERIC_PREFIX: &str = "num__";
/// Name prefix of one-hot categorical features
pub const CATEGORICAL_PREFIX: &str = "cat__";

/// Fitted parameters of the preprocessing stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessSpec {
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
}

/// Standard-scaled numeric column. Missing `mean`/`scale` pass the value through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
}

/// How the one-hot encoder treats a category it was not fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Reject the record
    #[default]
    Error,
    /// Encode as all-zero dummies
    Ignore,
}

/// One-hot encoded categorical column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

/// Ordered transformed feature values together with the names they were produced under.
///
/// The names are shared with the preprocessor that produced the vector, so a
/// vector always carries the exact name sequence of its own pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedFeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl TransformedFeatureVector {
    /// Pair names with values; both must have the same length.
    pub fn new(names: Arc<[String]>, values: Vec<f64>) -> Result<Self, AttributionError> {
        if names.len() != values.len() {
            return Err(AttributionError::NameLengthMismatch {
                values: values.len(),
                names: names.len(),
            });
        }
        Ok(Self { names, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn shared_names(&self) -> &Arc<[String]> {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a transformed feature by name
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }
}

/// Fitted feature preprocessor.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct FeaturePreprocessor {
    spec: PreprocessSpec,
    feature_names: Arc<[String]>,
}

impl FeaturePreprocessor {
    /// Build a preprocessor from fitted parameters.
    pub fn new(spec: PreprocessSpec) -> Result<Self, ModelError> {
        for numeric in &spec.numeric {
            if let Some(scale) = numeric.scale {
                if !scale.is_finite() || scale == 0.0 {
                    return Err(ModelError::Invalid(format!(
                        "numeric column `{}` has unusable scale {}",
                        numeric.column, scale
                    )));
                }
            }
            if numeric.mean.is_some_and(|m| !m.is_finite()) {
                return Err(ModelError::Invalid(format!(
                    "numeric column `{}` has a non-finite mean",
                    numeric.column
                )));
            }
        }

        for categorical in &spec.categorical {
            if categorical.categories.is_empty() {
                return Err(ModelError::Invalid(format!(
                    "categorical column `{}` has no fitted categories",
                    categorical.column
                )));
            }
            let mut seen = categorical.categories.clone();
            seen.sort();
            seen.dedup();
            if seen.len() != categorical.categories.len() {
                return Err(ModelError::Invalid(format!(
                    "categorical column `{}` lists a category twice",
                    categorical.column
                )));
            }
        }

        let feature_names: Vec<String> = spec
            .numeric
            .iter()
            .map(|n| format!("{}{}", NUMERIC_PREFIX, n.column))
            .chain(spec.categorical.iter().flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |category| format!("{}{}_{}", CATEGORICAL_PREFIX, c.column, category))
            }))
            .collect();

        Ok(Self {
            spec,
            feature_names: feature_names.into(),
        })
    }

    /// Transformed feature names, in output order.
    pub fn feature_names(&self) -> &Arc<[String]> {
        &self.feature_names
    }

    /// Number of transformed features produced.
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Apply the fitted transformation to one record.
    pub fn transform(
        &self,
        record: &ApplicantRecord,
    ) -> Result<TransformedFeatureVector, AssessmentError> {
        let mut values = Vec::with_capacity(self.feature_count());

        for numeric in &self.spec.numeric {
            let raw = record.numeric(&numeric.column).ok_or_else(|| {
                AssessmentError::SchemaMismatch(format!(
                    "pipeline expects numeric column `{}`, which applicant records do not carry",
                    numeric.column
                ))
            })?;
            let centered = raw - numeric.mean.unwrap_or(0.0);
            values.push(centered / numeric.scale.unwrap_or(1.0));
        }

        for categorical in &self.spec.categorical {
            let code = record.categorical(&categorical.column).ok_or_else(|| {
                AssessmentError::SchemaMismatch(format!(
                    "pipeline expects categorical column `{}`, which applicant records do not carry",
                    categorical.column
                ))
            })?;

            let known = categorical.categories.iter().any(|c| c == code);
            if !known && categorical.handle_unknown == HandleUnknown::Error {
                return Err(AssessmentError::SchemaMismatch(format!(
                    "category `{}` of column `{}` was not seen when the pipeline was fitted",
                    code, categorical.column
                )));
            }

            values.extend(
                categorical
                    .categories
                    .iter()
                    .map(|c| if c == code { 1.0 } else { 0.0 }),
            );
        }

        Ok(TransformedFeatureVector {
            names: Arc::clone(&self.feature_names),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::applicant::sample_record;

    fn spec() -> PreprocessSpec {
        PreprocessSpec {
            numeric: vec![
                NumericColumn {
                    column: "person_age".to_string(),
                    mean: Some(25.0),
                    scale: Some(5.0),
                },
                NumericColumn {
                    column: "loan_percent_income".to_string(),
                    mean: None,
                    scale: None,
                },
            ],
            categorical: vec![CategoricalColumn {
                column: "person_home_ownership".to_string(),
                categories: vec!["MORTGAGE".to_string(), "OWN".to_string(), "RENT".to_string()],
                handle_unknown: HandleUnknown::Error,
            }],
        }
    }

    #[test]
    fn test_feature_names_follow_column_kinds() {
        let preprocessor = FeaturePreprocessor::new(spec()).unwrap();
        let names: Vec<&str> = preprocessor.feature_names().iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "num__person_age",
                "num__loan_percent_income",
                "cat__person_home_ownership_MORTGAGE",
                "cat__person_home_ownership_OWN",
                "cat__person_home_ownership_RENT",
            ]
        );
    }

    #[test]
    fn test_transform_scales_and_encodes() {
        let preprocessor = FeaturePreprocessor::new(spec()).unwrap();
        let vector = preprocessor.transform(&sample_record()).unwrap();

        assert_eq!(vector.len(), preprocessor.feature_count());
        assert!((vector.values()[0] - 1.0).abs() < 1e-12); // (30 - 25) / 5
        assert!((vector.values()[1] - 0.2).abs() < 1e-12); // pass-through
        assert_eq!(&vector.values()[2..], &[0.0, 0.0, 1.0]);
        assert_eq!(vector.value_of("cat__person_home_ownership_RENT"), Some(1.0));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let preprocessor = FeaturePreprocessor::new(spec()).unwrap();
        let a = preprocessor.transform(&sample_record()).unwrap();
        let b = preprocessor.transform(&sample_record()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut spec = spec();
        spec.categorical[0].categories = vec!["MORTGAGE".to_string(), "OWN".to_string()];
        let preprocessor = FeaturePreprocessor::new(spec).unwrap();

        let err = preprocessor.transform(&sample_record()).unwrap_err();
        assert!(matches!(err, AssessmentError::SchemaMismatch(msg) if msg.contains("RENT")));
    }

    #[test]
    fn test_unknown_category_ignored() {
        let mut spec = spec();
        spec.categorical[0].categories = vec!["MORTGAGE".to_string(), "OWN".to_string()];
        spec.categorical[0].handle_unknown = HandleUnknown::Ignore;
        let preprocessor = FeaturePreprocessor::new(spec).unwrap();

        let vector = preprocessor.transform(&sample_record()).unwrap();
        assert_eq!(&vector.values()[2..], &[0.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let mut spec = spec();
        spec.numeric.push(NumericColumn {
            column: "person_gender".to_string(),
            mean: None,
            scale: None,
        });
        let preprocessor = FeaturePreprocessor::new(spec).unwrap();

        assert!(matches!(
            preprocessor.transform(&sample_record()),
            Err(AssessmentError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut spec = spec();
        spec.numeric[0].scale = Some(0.0);
        assert!(matches!(
            FeaturePreprocessor::new(spec),
            Err(ModelError::Invalid(_))
        ));
    }

    #[test]
    fn test_vector_length_invariant() {
        let names: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        assert!(TransformedFeatureVector::new(names.clone(), vec![1.0, 2.0]).is_ok());
        assert_eq!(
            TransformedFeatureVector::new(names, vec![1.0]),
            Err(AttributionError::NameLengthMismatch { values: 1, names: 2 })
        );
    }
}
