//! Credit Risk Service - Main Entry Point
//!
//! Consumes credit applications from NATS, scores and explains each applicant's
//! probability of default, and publishes the assessment.

use anyhow::{Context, Result};
use async_nats::Message;
use credit_risk_assessment::{
    config::{AppConfig, LoggingConfig},
    consumer::{decode_request, ApplicationConsumer},
    metrics::{AssessmentMetrics, MetricsReporter},
    AssessmentPublisher, CreditRiskAssessor,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);

    info!("Starting Credit Risk Service");

    let assessor = Arc::new(CreditRiskAssessor::from_config(&config)?);
    info!(
        medium = assessor.thresholds().medium,
        high = assessor.thresholds().high,
        top_n = config.explanation.top_n,
        min_impact_percent = config.explanation.min_impact_percent,
        "Configuration loaded"
    );
    let metrics = Arc::new(AssessmentMetrics::new());

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!(url = %config.nats.url, "Connected to NATS");

    let consumer = ApplicationConsumer::new(client.clone(), &config.nats.application_subject);
    let publisher = Arc::new(AssessmentPublisher::new(
        client.clone(),
        &config.nats.assessment_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        workers = num_workers,
        listening = %consumer.subject(),
        publishing = %publisher.subject(),
        "Starting application processing loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        let assessor = assessor.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            process_message(message, &assessor, &publisher, &metrics).await;

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let latency = metrics.get_latency_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} /s", metrics.get_throughput()),
                    avg_latency_us = latency.mean_us,
                    "Processing milestone"
                );
            }
            drop(permit);
        });
    }

    // Wait for in-flight assessments before the final summary.
    let _ = semaphore.acquire_many(num_workers as u32).await;
    info!("Service shutting down");
    metrics.print_summary();

    Ok(())
}

async fn process_message(
    message: Message,
    assessor: &CreditRiskAssessor,
    publisher: &AssessmentPublisher,
    metrics: &AssessmentMetrics,
) {
    let start_time = Instant::now();

    let request = match decode_request(&message.payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Failed to deserialize application");
            metrics.record_rejection();
            return;
        }
    };
    let applicant_id = request.applicant_id;

    let assessment = match assessor.assess(&applicant_id, &request.applicant) {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!(applicant_id = %applicant_id, error = %e, "Application rejected");
            metrics.record_rejection();
            return;
        }
    };

    let latency = start_time.elapsed();
    metrics.record_assessment(&assessment, latency);

    if let Err(e) = publisher.publish(&assessment, message.reply.as_ref()).await {
        error!(applicant_id = %applicant_id, error = %e, "Failed to publish assessment");
        return;
    }

    debug!(
        applicant_id = %applicant_id,
        pd = assessment.probability_of_default,
        risk_bucket = %assessment.risk_bucket,
        contributions = assessment.contributions.len(),
        latency_us = latency.as_micros(),
        "Assessment published"
    );
}

/// `RUST_LOG` takes precedence over the configured level
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
