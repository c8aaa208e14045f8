//! Attribution of the predicted default probability across features.
//!
//! Each transformed feature gets `|value| * importance`; the contributions
//! are renormalised and scaled by the PD so that, summed over all features,
//! they equal the PD expressed in percent. This is a ranking heuristic, not a
//! Shapley attribution.

use crate::error::AttributionError;
use crate::explain::labels::display_label;
use crate::explain::suggestions::SuggestionTable;
use crate::preprocess::TransformedFeatureVector;
use crate::types::assessment::ContributionEntry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Note reported when no feature clears the noise floor
pub const PROFILE_STRONG_NOTE: &str =
    "This applicant's profile already looks strong! No major risk-reduction steps needed.";

/// Limits applied when selecting contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationSettings {
    /// Maximum number of contributions retained
    pub top_n: usize,
    /// Contributions below this impact (in percent) are treated as noise
    pub min_impact_percent: f64,
}

impl Default for ExplanationSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            min_impact_percent: 0.1,
        }
    }
}

/// Outcome of explaining one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    impacts: Vec<f64>,
    contributions: Vec<ContributionEntry>,
}

impl Explanation {
    /// Impact percentage of every transformed feature, in pipeline order
    pub fn impacts(&self) -> &[f64] {
        &self.impacts
    }

    /// Retained contributions, highest impact first
    pub fn contributions(&self) -> &[ContributionEntry] {
        &self.contributions
    }

    pub fn into_contributions(self) -> Vec<ContributionEntry> {
        self.contributions
    }

    /// True when no feature cleared the noise floor
    pub fn is_profile_strong(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Sum of all impacts; equals `pd * 100` unless every contribution was zero
    pub fn total_impact(&self) -> f64 {
        self.impacts.iter().sum()
    }
}

/// Per-feature share of the PD, in percent.
///
/// Returns all zeros when no feature contributes, so a degenerate vector never
/// divides by zero.
pub fn impact_percentages(
    values: &[f64],
    importances: &[f64],
    pd: f64,
) -> Result<Vec<f64>, AttributionError> {
    if values.len() != importances.len() {
        return Err(AttributionError::ImportanceLengthMismatch {
            values: values.len(),
            importances: importances.len(),
        });
    }
    if !(0.0..=1.0).contains(&pd) {
        return Err(AttributionError::InvalidProbability(pd));
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(AttributionError::NonFiniteValue { index });
    }
    if let Some((index, &value)) = importances
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(AttributionError::InvalidImportance { index, value });
    }

    let raw: Vec<f64> = values
        .iter()
        .zip(importances)
        .map(|(value, importance)| value.abs() * importance.abs())
        .collect();
    let total: f64 = raw.iter().sum();

    if !total.is_finite() {
        return Err(AttributionError::ContributionOverflow);
    }
    if total == 0.0 {
        return Ok(vec![0.0; raw.len()]);
    }
    Ok(raw.iter().map(|r| r / total * pd * 100.0).collect())
}

/// Feature indices ordered by descending impact; equal impacts keep ascending index order.
pub fn rank_by_impact(impacts: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..impacts.len()).collect();
    order.sort_by(|&a, &b| impacts[b].total_cmp(&impacts[a]));
    order
}

/// Turns predictions into ranked, labelled contributions with suggestions.
///
/// Holds only immutable tables, so one instance serves all assessments.
#[derive(Debug, Clone, Default)]
pub struct Explainer {
    settings: ExplanationSettings,
    suggestions: SuggestionTable,
}

impl Explainer {
    pub fn new(settings: ExplanationSettings, suggestions: SuggestionTable) -> Self {
        Self {
            settings,
            suggestions,
        }
    }

    /// Explain a prediction from its transformed values, global importances and feature names.
    pub fn explain(
        &self,
        values: &[f64],
        importances: &[f64],
        names: &[String],
        pd: f64,
    ) -> Result<Explanation, AttributionError> {
        if names.len() != values.len() {
            return Err(AttributionError::NameLengthMismatch {
                values: values.len(),
                names: names.len(),
            });
        }
        let impacts = impact_percentages(values, importances, pd)?;

        let mut contributions = Vec::with_capacity(self.settings.top_n);
        for index in rank_by_impact(&impacts) {
            if contributions.len() >= self.settings.top_n {
                break;
            }
            let impact = impacts[index];
            if impact < self.settings.min_impact_percent {
                continue;
            }

            let name = &names[index];
            contributions.push(ContributionEntry {
                feature_name: name.clone(),
                label: display_label(name),
                impact_percent: impact,
                suggestion: self.suggestions.resolve(name).to_string(),
            });
        }

        debug!(
            features = impacts.len(),
            retained = contributions.len(),
            pd = pd,
            "Explanation computed"
        );

        Ok(Explanation {
            impacts,
            contributions,
        })
    }

    /// Explain a prediction using the names carried by the transformed vector.
    pub fn explain_vector(
        &self,
        vector: &TransformedFeatureVector,
        importances: &[f64],
        pd: f64,
    ) -> Result<Explanation, AttributionError> {
        self.explain(vector.values(), importances, vector.names(), pd)
    }
}
