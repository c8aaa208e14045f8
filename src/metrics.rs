//! Throughput, latency and outcome tracking for the assessment service.

use crate::types::assessment::{Assessment, RiskBucket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const LATENCY_WINDOW: usize = 10_000;

/// Counters and distributions for processed applications
pub struct AssessmentMetrics {
    /// Applications that produced an assessment
    pub assessments_processed: AtomicU64,
    /// Applications rejected before a PD was produced
    pub rejected: AtomicU64,
    /// Assessments published without an explanation
    pub explanation_failures: AtomicU64,
    /// Assessments where no feature cleared the noise floor
    pub profile_strong: AtomicU64,
    /// Low, Medium, High
    bucket_counts: [AtomicU64; 3],
    /// Assessment latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// PD histogram in tenths
    pd_histogram: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl AssessmentMetrics {
    pub fn new() -> Self {
        Self {
            assessments_processed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            explanation_failures: AtomicU64::new(0),
            profile_strong: AtomicU64::new(0),
            bucket_counts: Default::default(),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            pd_histogram: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed assessment
    pub fn record_assessment(&self, assessment: &Assessment, latency: Duration) {
        self.assessments_processed.fetch_add(1, Ordering::Relaxed);
        self.bucket_counts[bucket_index(assessment.risk_bucket)].fetch_add(1, Ordering::Relaxed);

        if !assessment.explanation_available {
            self.explanation_failures.fetch_add(1, Ordering::Relaxed);
        } else if assessment.contributions.is_empty() {
            self.profile_strong.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            if latencies.len() > LATENCY_WINDOW {
                latencies.drain(0..LATENCY_WINDOW / 2);
            }
        }

        let slot = (assessment.probability_of_default * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut histogram) = self.pd_histogram.write() {
            histogram[slot] += 1;
        }
    }

    /// Record an application that failed validation or inference
    pub fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bucket_count(&self, bucket: RiskBucket) -> u64 {
        self.bucket_counts[bucket_index(bucket)].load(Ordering::Relaxed)
    }

    /// Latency statistics over the retained window
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(latencies) if !latencies.is_empty() => latencies.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Assessments per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessments_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_pd_distribution(&self) -> [u64; 10] {
        self.pd_histogram.read().map(|h| *h).unwrap_or_default()
    }

    /// Log a summary of everything recorded so far
    pub fn print_summary(&self) {
        let processed = self.assessments_processed.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);
        let failures = self.explanation_failures.load(Ordering::Relaxed);
        let strong = self.profile_strong.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();
        let share = |count: u64| {
            if processed > 0 {
                count as f64 / processed as f64 * 100.0
            } else {
                0.0
            }
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            CREDIT RISK SERVICE - METRICS SUMMARY             ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Assessments: {:>8}  │  Throughput: {:>6.1} /s  │  Rejected: {:>6} ║",
            processed,
            self.get_throughput(),
            rejected
        );
        info!(
            "║ Latency (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}          ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!(
            "║ Explanations unavailable: {:>6}  │  Profile strong: {:>6}    ║",
            failures, strong
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        for bucket in [RiskBucket::Low, RiskBucket::Medium, RiskBucket::High] {
            let count = self.bucket_count(bucket);
            info!(
                "║   {:8}: {:>6} ({:>5.1}%)                                     ║",
                bucket.label(),
                count,
                share(count)
            );
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ PD Distribution:                                             ║");
        let histogram = self.get_pd_distribution();
        for (i, &count) in histogram.iter().enumerate() {
            let bar = "█".repeat(((share(count) / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                share(count),
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for AssessmentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket_index(bucket: RiskBucket) -> usize {
    match bucket {
        RiskBucket::Low => 0,
        RiskBucket::Medium => 1,
        RiskBucket::High => 2,
    }
}

/// Latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<AssessmentMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<AssessmentMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run the reporting loop
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::assessment::ContributionEntry;

    fn assessment(pd: f64, bucket: RiskBucket) -> Assessment {
        Assessment::new("metrics-test".to_string(), pd, bucket)
    }

    #[test]
    fn test_outcome_counters() {
        let metrics = AssessmentMetrics::new();

        let explained = assessment(0.3, RiskBucket::High).with_contributions(vec![
            ContributionEntry {
                feature_name: "num__loan_int_rate".to_string(),
                label: "Interest Rate".to_string(),
                impact_percent: 30.0,
                suggestion: "Lower it.".to_string(),
            },
        ]);
        metrics.record_assessment(&explained, Duration::from_micros(120));
        metrics.record_assessment(
            &assessment(0.05, RiskBucket::Low).with_note(true, "strong"),
            Duration::from_micros(80),
        );
        metrics.record_assessment(
            &assessment(0.15, RiskBucket::Medium).with_note(false, "unavailable"),
            Duration::from_micros(100),
        );
        metrics.record_rejection();

        assert_eq!(metrics.assessments_processed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.explanation_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.profile_strong.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.bucket_count(RiskBucket::High), 1);
        assert_eq!(metrics.bucket_count(RiskBucket::Low), 1);
    }

    #[test]
    fn test_pd_histogram() {
        let metrics = AssessmentMetrics::new();
        metrics.record_assessment(&assessment(0.0, RiskBucket::Low), Duration::ZERO);
        metrics.record_assessment(&assessment(0.19, RiskBucket::Medium), Duration::ZERO);
        metrics.record_assessment(&assessment(1.0, RiskBucket::High), Duration::ZERO);

        let histogram = metrics.get_pd_distribution();
        assert_eq!(histogram[0], 1);
        assert_eq!(histogram[1], 1);
        assert_eq!(histogram[9], 1);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = AssessmentMetrics::new();
        assert_eq!(metrics.get_latency_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_assessment(
                &assessment(0.5, RiskBucket::High),
                Duration::from_micros(us),
            );
        }
        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }
}
