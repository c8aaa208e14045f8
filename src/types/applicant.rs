//! Applicant data structures for credit risk assessment

use serde::{Deserialize, Serialize};
use std::fmt;

/// Housing situation of the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HomeOwnership {
    Rent,
    Own,
    Mortgage,
    Other,
}

impl HomeOwnership {
    pub const ALL: [HomeOwnership; 4] = [Self::Rent, Self::Own, Self::Mortgage, Self::Other];

    /// Category code as the pipeline was fitted with it
    pub fn code(self) -> &'static str {
        match self {
            Self::Rent => "RENT",
            Self::Own => "OWN",
            Self::Mortgage => "MORTGAGE",
            Self::Other => "OTHER",
        }
    }
}

/// Declared purpose of the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanIntent {
    Education,
    Medical,
    Venture,
    Personal,
    DebtConsolidation,
    HomeImprovement,
}

impl LoanIntent {
    pub const ALL: [LoanIntent; 6] = [
        Self::Education,
        Self::Medical,
        Self::Venture,
        Self::Personal,
        Self::DebtConsolidation,
        Self::HomeImprovement,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Education => "EDUCATION",
            Self::Medical => "MEDICAL",
            Self::Venture => "VENTURE",
            Self::Personal => "PERSONAL",
            Self::DebtConsolidation => "DEBTCONSOLIDATION",
            Self::HomeImprovement => "HOMEIMPROVEMENT",
        }
    }
}

/// Lender-assigned loan grade, A (best) to G (worst)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoanGrade {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl LoanGrade {
    pub const ALL: [LoanGrade; 7] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
        }
    }
}

/// Whether the credit bureau has a previous default on file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorDefault {
    #[serde(rename = "N")]
    No,
    #[serde(rename = "Y")]
    Yes,
}

impl PriorDefault {
    pub const ALL: [PriorDefault; 2] = [Self::No, Self::Yes];

    pub fn code(self) -> &'static str {
        match self {
            Self::No => "N",
            Self::Yes => "Y",
        }
    }
}

macro_rules! display_code {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        })*
    };
}

display_code!(HomeOwnership, LoanIntent, LoanGrade, PriorDefault);

/// One applicant's raw feature record.
///
/// Field names match the column names the pipeline was fitted on. Values are
/// expected to be range-checked by the caller; categorical fields can only
/// hold members of their fixed domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Age in years
    pub person_age: u32,

    /// Annual income
    pub person_income: f64,

    pub person_home_ownership: HomeOwnership,

    /// Employment length in years
    pub person_emp_length: f64,

    pub loan_intent: LoanIntent,

    pub loan_grade: LoanGrade,

    /// Requested loan amount
    pub loan_amnt: f64,

    /// Interest rate in percent
    pub loan_int_rate: f64,

    /// Loan amount as a fraction of annual income
    pub loan_percent_income: f64,

    pub cb_person_default_on_file: PriorDefault,

    /// Credit history length in years
    pub cb_person_cred_hist_length: u32,
}

impl ApplicantRecord {
    /// Numeric columns carried by every record
    pub const NUMERIC_COLUMNS: [&'static str; 7] = [
        "person_age",
        "person_income",
        "person_emp_length",
        "loan_amnt",
        "loan_int_rate",
        "loan_percent_income",
        "cb_person_cred_hist_length",
    ];

    /// Categorical columns carried by every record
    pub const CATEGORICAL_COLUMNS: [&'static str; 4] = [
        "person_home_ownership",
        "loan_intent",
        "loan_grade",
        "cb_person_default_on_file",
    ];

    /// Look up a numeric column by its fitted name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let value = match column {
            "person_age" => self.person_age as f64,
            "person_income" => self.person_income,
            "person_emp_length" => self.person_emp_length,
            "loan_amnt" => self.loan_amnt,
            "loan_int_rate" => self.loan_int_rate,
            "loan_percent_income" => self.loan_percent_income,
            "cb_person_cred_hist_length" => self.cb_person_cred_hist_length as f64,
            _ => return None,
        };
        Some(value)
    }

    /// Look up a categorical column by its fitted name, returning the category code.
    pub fn categorical(&self, column: &str) -> Option<&'static str> {
        match column {
            "person_home_ownership" => Some(self.person_home_ownership.code()),
            "loan_intent" => Some(self.loan_intent.code()),
            "loan_grade" => Some(self.loan_grade.code()),
            "cb_person_default_on_file" => Some(self.cb_person_default_on_file.code()),
            _ => None,
        }
    }

    /// Display rows (label, value) describing the applicant.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Age", self.person_age.to_string()),
            ("Annual Income (₹)", format!("{:.0}", self.person_income)),
            ("Home Ownership", self.person_home_ownership.to_string()),
            ("Employment Length (years)", format!("{:.1}", self.person_emp_length)),
            ("Loan Purpose", self.loan_intent.to_string()),
            ("Loan Grade", self.loan_grade.to_string()),
            ("Loan Amount (₹)", format!("{:.0}", self.loan_amnt)),
            ("Interest Rate (%)", format!("{:.1}", self.loan_int_rate)),
            ("Loan-to-Income Ratio", format!("{:.2}", self.loan_percent_income)),
            (
                "Previous Default on File",
                self.cb_person_default_on_file.to_string(),
            ),
            (
                "Credit History Length (years)",
                self.cb_person_cred_hist_length.to_string(),
            ),
        ]
    }

    /// Plain-text "Applicant Summary" table built from [`Self::summary`]
    pub fn render_summary(&self) -> String {
        let rows = self.summary();
        let width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);

        let mut out = String::from("Applicant Summary\n");
        for (label, value) in rows {
            out.push_str(&format!("{label:<width$}  {value}\n"));
        }
        out
    }
}

/// Inbound assessment request as carried on the message bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRequest {
    /// Caller-supplied identifier, echoed back on the assessment
    pub applicant_id: String,

    pub applicant: ApplicantRecord,
}

#[cfg(test)]
pub(crate) fn sample_record() -> ApplicantRecord {
    ApplicantRecord {
        person_age: 30,
        person_income: 50000.0,
        person_home_ownership: HomeOwnership::Rent,
        person_emp_length: 5.0,
        loan_intent: LoanIntent::Personal,
        loan_grade: LoanGrade::C,
        loan_amnt: 10000.0,
        loan_int_rate: 12.0,
        loan_percent_income: 0.2,
        cb_person_default_on_file: PriorDefault::No,
        cb_person_cred_hist_length: 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes_deserialize() {
        let json = r#"{
            "person_age": 41,
            "person_income": 82000,
            "person_home_ownership": "MORTGAGE",
            "person_emp_length": 12.0,
            "loan_intent": "DEBTCONSOLIDATION",
            "loan_grade": "B",
            "loan_amnt": 15000,
            "loan_int_rate": 9.5,
            "loan_percent_income": 0.18,
            "cb_person_default_on_file": "Y",
            "cb_person_cred_hist_length": 14
        }"#;

        let record: ApplicantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.person_home_ownership, HomeOwnership::Mortgage);
        assert_eq!(record.loan_intent, LoanIntent::DebtConsolidation);
        assert_eq!(record.cb_person_default_on_file, PriorDefault::Yes);
        assert_eq!(record.categorical("loan_intent"), Some("DEBTCONSOLIDATION"));
    }

    #[test]
    fn test_out_of_domain_category_rejected() {
        let mut value = serde_json::to_value(sample_record()).unwrap();
        value["loan_grade"] = serde_json::json!("H");
        assert!(serde_json::from_value::<ApplicantRecord>(value).is_err());
    }

    #[test]
    fn test_column_lookup() {
        let record = sample_record();
        for column in ApplicantRecord::NUMERIC_COLUMNS {
            assert!(record.numeric(column).is_some(), "{column}");
        }
        for column in ApplicantRecord::CATEGORICAL_COLUMNS {
            assert!(record.categorical(column).is_some(), "{column}");
        }
        assert_eq!(record.numeric("person_age"), Some(30.0));
        assert_eq!(record.numeric("loan_grade"), None);
        assert_eq!(record.categorical("person_gender"), None);
    }

    #[test]
    fn test_summary_rows() {
        let summary = sample_record().summary();
        assert_eq!(summary.len(), 11);
        assert_eq!(summary[0], ("Age", "30".to_string()));
        assert_eq!(summary[2], ("Home Ownership", "RENT".to_string()));
        assert_eq!(summary[1], ("Annual Income (₹)", "50000".to_string()));
        assert_eq!(summary[6], ("Loan Amount (₹)", "10000".to_string()));
        assert_eq!(summary[8], ("Loan-to-Income Ratio", "0.20".to_string()));
    }

    #[test]
    fn test_render_summary() {
        let rendered = sample_record().render_summary();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "Applicant Summary");
        assert!(lines[2].starts_with("Annual Income (₹) "));
        assert!(lines[2].ends_with("  50000"));
        assert!(lines[7].ends_with("  10000"));
        // values line up in one column
        let column = lines[1].find("30").unwrap();
        assert_eq!(lines[11].chars().count() - 1, column);
    }
}
