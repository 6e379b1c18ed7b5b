//! Internal metrics collection.
//!
//! Process-wide counters, gauges and latency histograms, exposed as a
//! snapshot on the health endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements, saturating at zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the dashboard host.
#[derive(Debug, Default)]
pub struct Metrics {
    // Remote API fetches
    pub fetch_requests: Counter,
    pub fetch_failures: Counter,
    pub auth_failures: Counter,
    pub batches_completed: Counter,
    pub batches_failed: Counter,

    // Access gate
    pub gate_denials: Counter,
    pub logins: Counter,
    pub login_failures: Counter,

    // Views
    pub views_rendered: Counter,
    pub stale_results_discarded: Counter,
    pub poll_ticks: Counter,

    // Latency histograms
    pub fetch_latency_ms: Histogram,
    pub batch_latency_ms: Histogram,

    // Gauges
    pub active_mounts: Gauge,
    pub active_pollers: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub fetch_requests: u64,
    pub fetch_failures: u64,
    pub auth_failures: u64,
    pub batches_completed: u64,
    pub batches_failed: u64,
    pub gate_denials: u64,
    pub logins: u64,
    pub login_failures: u64,
    pub views_rendered: u64,
    pub stale_results_discarded: u64,
    pub poll_ticks: u64,
    pub fetch_latency_mean_ms: f64,
    pub batch_latency_mean_ms: f64,
    pub active_mounts: u64,
    pub active_pollers: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            fetch_requests: self.fetch_requests.get(),
            fetch_failures: self.fetch_failures.get(),
            auth_failures: self.auth_failures.get(),
            batches_completed: self.batches_completed.get(),
            batches_failed: self.batches_failed.get(),
            gate_denials: self.gate_denials.get(),
            logins: self.logins.get(),
            login_failures: self.login_failures.get(),
            views_rendered: self.views_rendered.get(),
            stale_results_discarded: self.stale_results_discarded.get(),
            poll_ticks: self.poll_ticks.get(),
            fetch_latency_mean_ms: self.fetch_latency_ms.mean(),
            batch_latency_mean_ms: self.batch_latency_ms.mean(),
            active_mounts: self.active_mounts.get(),
            active_pollers: self.active_pollers.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
