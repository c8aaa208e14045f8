//! Priority-ordered suggestion rules

/// Suggestion used when no rule key matches
pub const FALLBACK_SUGGESTION: &str = "Improving this factor could reduce default probability.";

/// Default rules. Order is priority: the first key found inside a feature name wins.
const DEFAULT_RULES: &[(&str, &str)] = &[
    (
        "person_age",
        "Younger applicants tend to carry higher risk; age is not changeable but longer credit history helps.",
    ),
    (
        "person_income",
        "A higher income reduces default probability. Consider ways to increase earnings.",
    ),
    (
        "person_emp_length",
        "Longer employment tenure signals income stability to lenders.",
    ),
    (
        "loan_amnt",
        "Requesting a smaller loan amount would reduce risk exposure.",
    ),
    (
        "loan_int_rate",
        "A lower interest rate reduces repayment burden. Improving creditworthiness can help.",
    ),
    (
        "loan_percent_income",
        "Lowering the loan-to-income ratio by borrowing less or earning more reduces risk.",
    ),
    (
        "cb_person_cred_hist_length",
        "Building a longer credit history strengthens the applicant's profile.",
    ),
    (
        "person_home_ownership_RENT",
        "Stable housing or home ownership may slightly reduce risk.",
    ),
    (
        "person_home_ownership_OWN",
        "Owning a home is generally positive for creditworthiness.",
    ),
    (
        "person_home_ownership_MORTGAGE",
        "Having a mortgage indicates financial commitment and stability.",
    ),
    (
        "person_home_ownership_OTHER",
        "Stable housing or home ownership may slightly reduce risk.",
    ),
    ("loan_grade_A", "This is already the best loan grade."),
    ("loan_grade_B", FALLBACK_SUGGESTION),
    ("loan_grade_C", FALLBACK_SUGGESTION),
    (
        "loan_grade_D",
        "A better loan grade (A–C) would significantly lower risk.",
    ),
    (
        "loan_grade_E",
        "A better loan grade (A–C) would significantly lower risk.",
    ),
    (
        "loan_grade_F",
        "A better loan grade (A–C) would significantly lower risk.",
    ),
    (
        "loan_grade_G",
        "A better loan grade (A–C) would significantly lower risk.",
    ),
    (
        "loan_intent_EDUCATION",
        "Education loans are generally viewed as investments in future earning potential.",
    ),
    (
        "loan_intent_MEDICAL",
        "Medical loans are essential; maintaining insurance coverage can reduce need.",
    ),
    ("loan_intent_VENTURE", FALLBACK_SUGGESTION),
    ("loan_intent_PERSONAL", FALLBACK_SUGGESTION),
    (
        "loan_intent_DEBTCONSOLIDATION",
        "Consolidating debt can be positive if it lowers overall payments.",
    ),
    (
        "loan_intent_HOMEIMPROVEMENT",
        "Home improvement loans can add value to owned property.",
    ),
    (
        "cb_person_default_on_file_Y",
        "Having a previous default significantly raises risk. Clearing obligations helps.",
    ),
    (
        "cb_person_default_on_file_N",
        "No previous default is a positive signal.",
    ),
];

/// Feature-name substring key and the suggestion it selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRule {
    pub key: String,
    pub text: String,
}

impl SuggestionRule {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Ordered suggestion rules with a fallback
#[derive(Debug, Clone)]
pub struct SuggestionTable {
    rules: Vec<SuggestionRule>,
    fallback: String,
}

impl SuggestionTable {
    pub fn new(rules: Vec<SuggestionRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    pub fn rules(&self) -> &[SuggestionRule] {
        &self.rules
    }

    /// First rule whose key occurs in the transformed feature name.
    pub fn matching_rule(&self, feature_name: &str) -> Option<&SuggestionRule> {
        self.rules
            .iter()
            .find(|rule| feature_name.contains(rule.key.as_str()))
    }

    /// Suggestion text for a transformed (unstripped) feature name.
    pub fn resolve(&self, feature_name: &str) -> &str {
        self.matching_rule(feature_name)
            .map(|rule| rule.text.as_str())
            .unwrap_or(&self.fallback)
    }
}

impl Default for SuggestionTable {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|&(key, text)| SuggestionRule::new(key, text))
            .collect();
        Self::new(rules, FALLBACK_SUGGESTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_resolves_exactly() {
        let table = SuggestionTable::default();
        assert_eq!(
            table.resolve("cat__loan_grade_D"),
            "A better loan grade (A–C) would significantly lower risk."
        );
        assert_eq!(
            table.resolve("cat__cb_person_default_on_file_Y"),
            "Having a previous default significantly raises risk. Clearing obligations helps."
        );
        assert_eq!(
            table.resolve("num__loan_percent_income"),
            "Lowering the loan-to-income ratio by borrowing less or earning more reduces risk."
        );
    }

    #[test]
    fn test_unknown_name_uses_fallback() {
        let table = SuggestionTable::default();
        assert!(table.matching_rule("num__months_since_delinquency").is_none());
        assert_eq!(
            table.resolve("num__months_since_delinquency"),
            FALLBACK_SUGGESTION
        );
    }

    #[test]
    fn test_first_match_wins() {
        let table = SuggestionTable::new(
            vec![
                SuggestionRule::new("loan_grade", "generic grade advice"),
                SuggestionRule::new("loan_grade_D", "specific grade D advice"),
            ],
            "fallback",
        );
        assert_eq!(table.resolve("cat__loan_grade_D"), "generic grade advice");
    }

    #[test]
    fn test_default_table_order() {
        let table = SuggestionTable::default();
        assert_eq!(table.rules().len(), 26);
        assert_eq!(table.rules()[0].key, "person_age");
        assert_eq!(table.rules()[25].key, "cb_person_default_on_file_N");
    }
}
