//! Run metrics.
//!
//! With the `telemetry` feature every run records task counts, per-worker
//! load and a latency histogram. Without it a no-op stub with the same API is
//! compiled in.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone)]
    pub struct Metrics {
        start_time: Instant,
    }

    impl Metrics {
        pub fn new(_: usize) -> Self {
            Self {
                start_time: Instant::now(),
            }
        }
        pub fn record_task_execution(&self, _: usize, _: u64, _: bool) {}
        pub fn record_task_panic(&self) {}
        pub fn record_task_aborted(&self) {}
        pub fn snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                elapsed: self.start_time.elapsed(),
                ..MetricsSnapshot::default()
            }
        }
    }

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
        pub fn tasks_executed(&self) -> u64 {
            self.tasks_succeeded + self.tasks_failed
        }
        pub fn utilization(&self) -> f64 {
            0.0
        }
        pub fn tasks_per_second(&self) -> f64 {
            0.0
        }
    }
}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
