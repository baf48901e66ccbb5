//! Per-run metrics.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// One hour in nanoseconds
const MAX_TRACKED_LATENCY_NS: u64 = 3_600_000_000_000;

/// Counters and latency histogram for a single run.
///
/// Created fresh at the start of every run and frozen into a
/// [`MetricsSnapshot`] when the run returns.
#[derive(Debug)]
pub struct Metrics {
    tasks_succeeded: AtomicU64,
    tasks_failed: AtomicU64,
    tasks_panicked: AtomicU64,
    tasks_aborted: AtomicU64,

    busy_time_ns: AtomicU64,
    per_worker: Vec<AtomicU64>,

    latency_histogram: RwLock<Option<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new(num_workers: usize) -> Self {
        // 3 significant figures; the histogram is skipped if it cannot be built
        let histogram = Histogram::new_with_max(MAX_TRACKED_LATENCY_NS, 3).ok();

        Self {
            tasks_succeeded: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
            tasks_aborted: AtomicU64::new(0),
            busy_time_ns: AtomicU64::new(0),
            per_worker: (0..num_workers).map(|_| AtomicU64::new(0)).collect(),
            latency_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    /// Record a handler invocation on `worker`.
    pub fn record_task_execution(&self, worker: usize, duration_ns: u64, succeeded: bool) {
        if succeeded {
            self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.busy_time_ns.fetch_add(duration_ns, Ordering::Relaxed);

        if let Some(count) = self.per_worker.get(worker) {
            count.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(hist) = self.latency_histogram.write().as_mut() {
            let _ = hist.record(duration_ns.min(MAX_TRACKED_LATENCY_NS));
        }
    }

    /// A panic also counts as a failed execution.
    pub fn record_task_panic(&self) {
        self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_aborted(&self) {
        self.tasks_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.latency_histogram.read();
        let (avg, p50, p95, p99, max) = match histogram.as_ref() {
            Some(h) if h.len() > 0 => (
                h.mean() as u64,
                h.value_at_quantile(0.50),
                h.value_at_quantile(0.95),
                h.value_at_quantile(0.99),
                h.max(),
            ),
            _ => (0, 0, 0, 0, 0),
        };

        MetricsSnapshot {
            elapsed: self.start_time.elapsed(),
            tasks_succeeded: self.tasks_succeeded.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_panicked: self.tasks_panicked.load(Ordering::Relaxed),
            tasks_aborted: self.tasks_aborted.load(Ordering::Relaxed),
            busy_time_ns: self.busy_time_ns.load(Ordering::Relaxed),
            per_worker_executed: self
                .per_worker
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            avg_latency_ns: avg,
            p50_latency_ns: p50,
            p95_latency_ns: p95,
            p99_latency_ns: p99,
            max_latency_ns: max,
        }
    }
}

/// Frozen view of a run's metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub elapsed: Duration,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub tasks_panicked: u64,
    pub tasks_aborted: u64,
    pub busy_time_ns: u64,
    pub per_worker_executed: Vec<u64>,
    pub avg_latency_ns: u64,
    pub p50_latency_ns: u64,
    pub p95_latency_ns: u64,
    pub p99_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl MetricsSnapshot {
    /// Tasks whose handler was actually invoked.
    pub fn tasks_executed(&self) -> u64 {
        self.tasks_succeeded + self.tasks_failed
    }

    /// Fraction of available worker time spent inside handlers (0.0 to 1.0).
    pub fn utilization(&self) -> f64 {
        let workers = self.per_worker_executed.len() as f64;
        let available = self.elapsed.as_nanos() as f64 * workers;
        if available == 0.0 {
            return 0.0;
        }
        (self.busy_time_ns as f64 / available).min(1.0)
    }

    pub fn tasks_per_second(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.tasks_executed() as f64 / seconds
    }
}
