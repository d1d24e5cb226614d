//! Prediction counters and latency statistics.

use crate::types::prediction::PredictionOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is dropped
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the prediction worker
pub struct PredictionMetrics {
    pub survived: AtomicU64,
    pub did_not_survive: AtomicU64,
    pub unexpected: AtomicU64,
    pub rejected: AtomicU64,
    /// Requests that failed inside the classifier or could not be parsed
    pub failed: AtomicU64,
    /// Processing times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PredictionMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            survived: AtomicU64::new(0),
            did_not_survive: AtomicU64::new(0),
            unexpected: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a request that produced an outcome
    pub fn record_outcome(&self, outcome: &PredictionOutcome, processing_time: Duration) {
        let counter = match outcome {
            PredictionOutcome::Survived => &self.survived,
            PredictionOutcome::DidNotSurvive => &self.did_not_survive,
            PredictionOutcome::Unexpected { .. } => &self.unexpected,
            PredictionOutcome::Rejected { .. } => &self.rejected,
            PredictionOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Record a request that produced no outcome
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests answered with a verdict: a label, an unexpected output or a rejection
    pub fn total(&self) -> u64 {
        self.survived.load(Ordering::Relaxed)
            + self.did_not_survive.load(Ordering::Relaxed)
            + self.unexpected.load(Ordering::Relaxed)
            + self.rejected.load(Ordering::Relaxed)
    }

    /// Share of labelled predictions that were "Survived"
    pub fn survival_rate(&self) -> f64 {
        let survived = self.survived.load(Ordering::Relaxed);
        let labelled = survived + self.did_not_survive.load(Ordering::Relaxed);
        if labelled > 0 {
            survived as f64 / labelled as f64
        } else {
            0.0
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return ProcessingStats::default(),
        };

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let processing = self.get_processing_stats();

        info!(
            total = self.total(),
            survived = self.survived.load(Ordering::Relaxed),
            did_not_survive = self.did_not_survive.load(Ordering::Relaxed),
            unexpected = self.unexpected.load(Ordering::Relaxed),
            rejected = self.rejected.load(Ordering::Relaxed),
            failed = self.failed.load(Ordering::Relaxed),
            survival_rate = format!("{:.1}%", self.survival_rate() * 100.0),
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Prediction summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Processing time"
        );
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
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

    #[test]
    fn test_outcome_counting() {
        let metrics = PredictionMetrics::new();

        metrics.record_outcome(&PredictionOutcome::Survived, Duration::from_micros(100));
        metrics.record_outcome(&PredictionOutcome::DidNotSurvive, Duration::from_micros(200));
        metrics.record_outcome(&PredictionOutcome::DidNotSurvive, Duration::from_micros(300));
        metrics.record_outcome(&PredictionOutcome::Unexpected { raw: 2 }, Duration::from_micros(50));
        metrics.record_outcome(
            &PredictionOutcome::Rejected {
                reason: "bad".to_string(),
            },
            Duration::from_micros(10),
        );
        metrics.record_outcome(
            &PredictionOutcome::Failed {
                reason: "crashed".to_string(),
            },
            Duration::from_micros(20),
        );
        metrics.record_failure();

        assert_eq!(metrics.total(), 5);
        assert_eq!(metrics.unexpected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.failed.load(Ordering::Relaxed), 2);
        assert!((metrics.survival_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PredictionMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in 1..=100 {
            metrics.record_outcome(&PredictionOutcome::Survived, Duration::from_micros(us));
        }
        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.mean_us, 50);
        assert_eq!(stats.p50_us, 51);
        assert_eq!(stats.p99_us, 100);
        assert_eq!(stats.max_us, 100);
    }
}
