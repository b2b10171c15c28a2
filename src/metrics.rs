//! Serving metrics: prediction counts, rejections and latency statistics.

use crate::types::prediction::ConfidenceBand;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the prediction endpoint
pub struct ServingMetrics {
    /// Successful predictions
    predictions_served: AtomicU64,
    /// Requests rejected with an error
    requests_rejected: AtomicU64,
    /// Predictions per model key
    by_model: RwLock<BTreeMap<String, u64>>,
    /// Predictions per confidence band
    by_band: RwLock<BTreeMap<ConfidenceBand, u64>>,
    /// Rejections per error kind
    rejections: RwLock<BTreeMap<String, u64>>,
    /// Approved decisions
    approvals: AtomicU64,
    /// Processing times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl ServingMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            by_model: RwLock::new(BTreeMap::new()),
            by_band: RwLock::new(BTreeMap::new()),
            rejections: RwLock::new(BTreeMap::new()),
            approvals: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(
        &self,
        model_key: &str,
        band: ConfidenceBand,
        approved: bool,
        elapsed: Duration,
    ) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if approved {
            self.approvals.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut by_model) = self.by_model.write() {
            *by_model.entry(model_key.to_string()).or_insert(0) += 1;
        }
        if let Ok(mut by_band) = self.by_band.write() {
            *by_band.entry(band).or_insert(0) += 1;
        }
        if let Ok(mut times) = self.latencies.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only the most recent window
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Record a request that failed with the given error kind
    pub fn record_rejection(&self, kind: &str) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut rejections) = self.rejections.write() {
            *rejections.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Latency statistics over the recent window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let approvals = self.approvals.load(Ordering::Relaxed);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            predictions_served: served,
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            approval_rate: if served > 0 {
                approvals as f64 / served as f64
            } else {
                0.0
            },
            throughput: self.throughput(),
            by_model: read_map(&self.by_model),
            by_confidence: self
                .by_band
                .read()
                .map(|m| m.iter().map(|(band, n)| (band.to_string(), *n)).collect::<BTreeMap<_, _>>())
                .unwrap_or_default(),
            rejections: read_map(&self.rejections),
            latency: self.latency_stats(),
        }
    }

    /// Log a summary of the current counters
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let latency = &snapshot.latency;

        info!(
            served = snapshot.predictions_served,
            rejected = snapshot.requests_rejected,
            approval_rate = format!("{:.1}%", snapshot.approval_rate * 100.0),
            throughput = format!("{:.2} req/s", snapshot.throughput),
            "Serving metrics summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Prediction latency"
        );
        for (model, count) in &snapshot.by_model {
            info!(model = %model, predictions = count, "Predictions by model");
        }
        for (kind, count) in &snapshot.rejections {
            info!(kind = %kind, count = count, "Rejected requests");
        }
    }
}

fn read_map(lock: &RwLock<BTreeMap<String, u64>>) -> BTreeMap<String, u64> {
    lock.read().map(|m| m.clone()).unwrap_or_default()
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Body of `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub predictions_served: u64,
    pub requests_rejected: u64,
    pub approval_rate: f64,
    pub throughput: f64,
    pub by_model: BTreeMap<String, u64>,
    pub by_confidence: BTreeMap<String, u64>,
    pub rejections: BTreeMap<String, u64>,
    pub latency: LatencyStats,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<ServingMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServingMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}
