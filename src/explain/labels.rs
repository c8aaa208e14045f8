//! Display labels for transformed feature names

use crate::preprocess::{CATEGORICAL_PREFIX, NUMERIC_PREFIX};

/// Column-kind prefixes the preprocessing stage adds, stripped in this order
const PIPELINE_PREFIXES: [&str; 2] = [NUMERIC_PREFIX, CATEGORICAL_PREFIX];

/// Canonical feature name -> display label
const DISPLAY_LABELS: &[(&str, &str)] = &[
    ("person_age", "Age"),
    ("person_income", "Annual Income"),
    ("person_emp_length", "Employment Length"),
    ("person_home_ownership_RENT", "Home Ownership: Rent"),
    ("person_home_ownership_OWN", "Home Ownership: Own"),
    ("person_home_ownership_MORTGAGE", "Home Ownership: Mortgage"),
    ("person_home_ownership_OTHER", "Home Ownership: Other"),
    ("loan_intent_EDUCATION", "Loan Purpose: Education"),
    ("loan_intent_MEDICAL", "Loan Purpose: Medical"),
    ("loan_intent_VENTURE", "Loan Purpose: Venture"),
    ("loan_intent_PERSONAL", "Loan Purpose: Personal"),
    ("loan_intent_DEBTCONSOLIDATION", "Loan Purpose: Debt Consolidation"),
    ("loan_intent_HOMEIMPROVEMENT", "Loan Purpose: Home Improvement"),
    ("loan_grade_A", "Loan Grade: A"),
    ("loan_grade_B", "Loan Grade: B"),
    ("loan_grade_C", "Loan Grade: C"),
    ("loan_grade_D", "Loan Grade: D"),
    ("loan_grade_E", "Loan Grade: E"),
    ("loan_grade_F", "Loan Grade: F"),
    ("loan_grade_G", "Loan Grade: G"),
    ("loan_amnt", "Loan Amount"),
    ("loan_int_rate", "Interest Rate"),
    ("loan_percent_income", "Loan-to-Income Ratio"),
    ("cb_person_default_on_file_Y", "Previous Default: Yes"),
    ("cb_person_default_on_file_N", "Previous Default: No"),
    ("cb_person_cred_hist_length", "Credit History Length"),
];

/// Remove the preprocessing stage's column-kind prefixes.
pub fn strip_pipeline_prefixes(name: &str) -> &str {
    let mut stripped = name;
    for prefix in PIPELINE_PREFIXES {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            stripped = rest;
        }
    }
    stripped
}

/// Human-readable label for a transformed feature name.
///
/// Known features use the fixed label table; anything else has underscores
/// replaced by spaces and is title-cased.
pub fn display_label(feature_name: &str) -> String {
    let canonical = strip_pipeline_prefixes(feature_name);
    DISPLAY_LABELS
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| title_case(&canonical.replace('_', " ")))
}

/// Uppercase the first cased character of every word and lowercase the rest.
///
/// A word is any run of cased characters, so digits and punctuation start a
/// new word (`"3rd party"` becomes `"3Rd Party"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_cased = false;

    for c in text.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && previous_cased {
            out.extend(c.to_lowercase());
        } else if cased {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        previous_cased = cased;
    }
    out
}
