//! Type definitions for credit risk assessment

pub mod applicant;
pub mod assessment;

pub use applicant::{ApplicantRecord, ApplicationRequest};
pub use assessment::{Assessment, ContributionEntry, RiskBucket, RiskBucketThresholds};
