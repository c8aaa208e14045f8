//! NATS publisher for completed assessments

use crate::types::assessment::Assessment;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes assessments to the requester's reply subject or the default subject
#[derive(Clone)]
pub struct AssessmentPublisher {
    client: Client,
    subject: String,
}

impl AssessmentPublisher {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish an assessment, answering `reply` when the application was a request
    pub async fn publish(&self, assessment: &Assessment, reply: Option<&Subject>) -> Result<()> {
        let payload = serde_json::to_vec(assessment)?;
        let target = target_subject(reply, &self.subject);

        self.client.publish(target.clone(), payload.into()).await?;

        debug!(
            assessment_id = %assessment.assessment_id,
            applicant_id = %assessment.applicant_id,
            subject = %target,
            pd = assessment.probability_of_default,
            "Published assessment"
        );

        Ok(())
    }

    /// Default subject for assessments without a reply subject
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Reply subject if present, otherwise the default subject
pub fn target_subject(reply: Option<&Subject>, default_subject: &str) -> String {
    reply
        .map(|subject| subject.to_string())
        .unwrap_or_else(|| default_subject.to_string())
}
