//! NATS message consumer for incoming credit applications

use crate::types::applicant::ApplicationRequest;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving application requests from NATS
pub struct ApplicationConsumer {
    client: Client,
    subject: String,
}

impl ApplicationConsumer {
    /// Create a new application consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the application subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to application subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Decode a JSON application payload
pub fn decode_request(payload: &[u8]) -> Result<ApplicationRequest, serde_json::Error> {
    serde_json::from_slice(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::applicant::{LoanGrade, PriorDefault};

    #[test]
    fn test_decode_request() {
        let payload = br#"{
            "applicant_id": "app-42",
            "applicant": {
                "person_age": 30,
                "person_income": 50000.0,
                "person_home_ownership": "RENT",
                "person_emp_length": 5.0,
                "loan_intent": "PERSONAL",
                "loan_grade": "C",
                "loan_amnt": 10000.0,
                "loan_int_rate": 12.0,
                "loan_percent_income": 0.2,
                "cb_person_default_on_file": "N",
                "cb_person_cred_hist_length": 5
            }
        }"#;

        let request = decode_request(payload).unwrap();
        assert_eq!(request.applicant_id, "app-42");
        assert_eq!(request.applicant.loan_grade, LoanGrade::C);
        assert_eq!(request.applicant.cb_person_default_on_file, PriorDefault::No);
    }

    #[test]
    fn test_decode_rejects_unknown_category() {
        let payload = br#"{
            "applicant_id": "app-43",
            "applicant": {
                "person_age": 30,
                "person_income": 50000.0,
                "person_home_ownership": "CASTLE",
                "person_emp_length": 5.0,
                "loan_intent": "PERSONAL",
                "loan_grade": "C",
                "loan_amnt": 10000.0,
                "loan_int_rate": 12.0,
                "loan_percent_income": 0.2,
                "cb_person_default_on_file": "N",
                "cb_person_cred_hist_length": 5
            }
        }"#;

        assert!(decode_request(payload).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        assert!(decode_request(br#"{"applicant_id": "x", "applicant": {}}"#).is_err());
    }
}
