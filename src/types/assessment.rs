//! Assessment result data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk tier derived from the probability of default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    /// Classify a probability of default.
    ///
    /// Thresholds are strict lower bounds of the next bucket up, so a PD equal
    /// to a threshold lands in the higher bucket.
    pub fn from_pd(pd: f64, thresholds: &RiskBucketThresholds) -> Self {
        if pd < thresholds.medium {
            RiskBucket::Low
        } else if pd < thresholds.high {
            RiskBucket::Medium
        } else {
            RiskBucket::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::Low => "Low",
            RiskBucket::Medium => "Medium",
            RiskBucket::High => "High",
        }
    }

    /// Lending guidance shown alongside the bucket
    pub fn guidance(self) -> &'static str {
        match self {
            RiskBucket::Low => {
                "This applicant has a low risk of default. Likely eligible for favorable terms."
            }
            RiskBucket::Medium => {
                "Moderate risk. Consider additional verification or adjusted terms."
            }
            RiskBucket::High => {
                "High risk of default. Exercise caution, may require collateral or higher rates."
            }
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// PD thresholds separating the risk buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBucketThresholds {
    /// Lowest PD classified as Medium
    pub medium: f64,
    /// Lowest PD classified as High
    pub high: f64,
}

impl Default for RiskBucketThresholds {
    fn default() -> Self {
        Self {
            medium: 0.10,
            high: 0.25,
        }
    }
}

/// One retained feature of an explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionEntry {
    /// Transformed feature name as emitted by the pipeline (e.g. `cat__loan_grade_D`)
    pub feature_name: String,

    /// Human-readable label (e.g. `Loan Grade: D`)
    pub label: String,

    /// Share of the predicted default probability attributed to this feature, in percent
    pub impact_percent: f64,

    pub suggestion: String,
}

impl fmt::Display for ContributionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "• {}", self.label)?;
        writeln!(f, "  Impact on PD: {:.1}%", self.impact_percent)?;
        write!(f, "  Suggestion: {}", self.suggestion)
    }
}

/// Result of assessing one applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Caller-supplied applicant identifier
    pub applicant_id: String,

    /// Probability of default (0.0 - 1.0)
    pub probability_of_default: f64,

    pub risk_bucket: RiskBucket,

    /// Guidance text for the risk bucket
    pub guidance: String,

    /// Ranked risk drivers; empty when the explanation is unavailable or the
    /// profile has no driver above the noise floor
    pub contributions: Vec<ContributionEntry>,

    /// False when the explanation could not be computed
    pub explanation_available: bool,

    /// Outcome note for the explanation section, if any
    pub explanation_note: Option<String>,

    /// Assessment timestamp
    pub timestamp: DateTime<Utc>,
}

impl Assessment {
    /// Create an assessment carrying only the prediction.
    pub fn new(applicant_id: String, probability_of_default: f64, risk_bucket: RiskBucket) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            applicant_id,
            probability_of_default,
            risk_bucket,
            guidance: risk_bucket.guidance().to_string(),
            contributions: Vec::new(),
            explanation_available: false,
            explanation_note: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach ranked contributions
    pub fn with_contributions(mut self, contributions: Vec<ContributionEntry>) -> Self {
        self.contributions = contributions;
        self.explanation_available = true;
        self
    }

    /// Attach an explanation note, keeping availability as given
    pub fn with_note(mut self, available: bool, note: impl Into<String>) -> Self {
        self.explanation_available = available;
        self.explanation_note = Some(note.into());
        self
    }

    /// Plain-text report of the assessment
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Probability of Default: {:.1}%\n",
            self.probability_of_default * 100.0
        ));
        out.push_str(&format!("Risk Level: {}\n", self.risk_bucket));
        out.push_str(&self.guidance);
        out.push_str("\n\nHow Could This Applicant Reduce Risk?\n");

        for entry in &self.contributions {
            out.push_str(&entry.to_string());
            out.push_str("\n\n");
        }
        if let Some(note) = &self.explanation_note {
            out.push_str(note);
            out.push('\n');
        }
        out
    }
}
