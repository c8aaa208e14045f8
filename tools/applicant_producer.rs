//! Applicant Producer
//!
//! Generates random credit applications and publishes them to NATS for
//! exercising the credit risk service. Without a NATS connection it scores
//! the generated applicants locally and prints the reports.

use credit_risk_assessment::types::applicant::{
    ApplicantRecord, ApplicationRequest, HomeOwnership, LoanGrade, LoanIntent, PriorDefault,
};
use credit_risk_assessment::{AppConfig, CreditRiskAssessor};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Random applicant generator
struct ApplicantGenerator {
    rng: rand::rngs::ThreadRng,
    applicant_counter: u64,
}

impl ApplicantGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            applicant_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.applicant_counter += 1;
        format!("app_{:010}", self.applicant_counter)
    }

    /// Established borrower with a good grade and modest request
    fn generate_prime(&mut self) -> ApplicationRequest {
        let income = self.rng.gen_range(45_000.0..180_000.0_f64).round();
        let amount = self.rng.gen_range(1_000.0..15_000.0_f64).round();

        let applicant = ApplicantRecord {
            person_age: self.rng.gen_range(28..65),
            person_income: income,
            person_home_ownership: self.pick(&[HomeOwnership::Mortgage, HomeOwnership::Own]),
            person_emp_length: self.rng.gen_range(3..25) as f64,
            loan_intent: self.pick(&LoanIntent::ALL),
            loan_grade: self.pick(&[LoanGrade::A, LoanGrade::B]),
            loan_amnt: amount,
            loan_int_rate: round2(self.rng.gen_range(5.4..10.5)),
            loan_percent_income: round2(amount / income),
            cb_person_default_on_file: PriorDefault::No,
            cb_person_cred_hist_length: self.rng.gen_range(5..20),
        };

        ApplicationRequest {
            applicant_id: self.next_id(),
            applicant,
        }
    }

    /// Thin-file or stretched borrower
    fn generate_subprime(&mut self) -> ApplicationRequest {
        let income = self.rng.gen_range(9_000.0..45_000.0_f64).round();
        let amount = self.rng.gen_range(5_000.0..30_000.0_f64).round();

        let applicant = ApplicantRecord {
            person_age: self.rng.gen_range(20..30),
            person_income: income,
            person_home_ownership: self.pick(&[HomeOwnership::Rent, HomeOwnership::Other]),
            person_emp_length: self.rng.gen_range(0..3) as f64,
            loan_intent: self.pick(&[
                LoanIntent::Medical,
                LoanIntent::DebtConsolidation,
                LoanIntent::Venture,
            ]),
            loan_grade: self.pick(&[LoanGrade::D, LoanGrade::E, LoanGrade::F, LoanGrade::G]),
            loan_amnt: amount,
            loan_int_rate: round2(self.rng.gen_range(13.0..22.0)),
            loan_percent_income: round2((amount / income).min(0.83)),
            cb_person_default_on_file: self.pick(&PriorDefault::ALL),
            cb_person_cred_hist_length: self.rng.gen_range(2..5),
        };

        ApplicationRequest {
            applicant_id: self.next_id(),
            applicant,
        }
    }

    fn pick<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("applicant_producer=info".parse()?),
        )
        .init();

    info!("Starting Applicant Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("credit.applications");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let subprime_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        subprime_rate = subprime_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, subprime_rate, delay_ms).await;
        }
    };

    let mut generator = ApplicantGenerator::new();
    let mut rng = rand::thread_rng();
    let subprime_rate = subprime_rate.clamp(0.0, 1.0);

    let mut prime_count = 0;
    let mut subprime_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(subprime_rate) {
            subprime_count += 1;
            generator.generate_subprime()
        } else {
            prime_count += 1;
            generator.generate_prime()
        };

        let payload = serde_json::to_vec(&request)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} applications ({} prime, {} subprime)",
                i + 1,
                count,
                prime_count,
                subprime_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    client.flush().await?;

    info!(
        "Completed! Published {} applications ({} prime, {} subprime)",
        count, prime_count, subprime_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, subprime_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Using default configuration");
        AppConfig::default()
    });
    let assessor = match CreditRiskAssessor::from_config(&config) {
        Ok(assessor) => Some(assessor),
        Err(e) => {
            warn!(error = %e, "Model unavailable; printing applications only");
            None
        }
    };

    let mut generator = ApplicantGenerator::new();
    let mut rng = rand::thread_rng();
    let subprime_rate = subprime_rate.clamp(0.0, 1.0);

    for i in 0..count {
        let request = if rng.gen_bool(subprime_rate) {
            generator.generate_subprime()
        } else {
            generator.generate_prime()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!(
                "Sample application {}:\n{}",
                i + 1,
                serde_json::to_string_pretty(&request)?
            );

            if let Some(assessor) = &assessor {
                match assessor.assess(&request.applicant_id, &request.applicant) {
                    Ok(assessment) => info!(
                        "Local assessment:\n{}\n{}",
                        request.applicant.render_summary(),
                        assessment.render()
                    ),
                    Err(e) => warn!(applicant_id = %request.applicant_id, error = %e, "Assessment failed"),
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
