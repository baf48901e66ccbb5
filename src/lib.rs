//! workpool - bounded task execution with per-task outcomes
//!
//! Runs a finite list of tasks on a fixed number of worker threads that pull
//! from one shared FIFO queue, and returns an outcome for every task:
//! succeeded, failed, or aborted because the run was cancelled.
//!
//! # Quick Start
//!
//! ```no_run
//! use workpool::prelude::*;
//!
//! let files = vec!["a.txt", "b.txt", "c.txt"];
//!
//! let report = execute(2, files, |name| std::fs::read(name).map(|bytes| bytes.len()))
//!     .unwrap();
//!
//! for (name, err) in report.failures() {
//!     eprintln!("{}: {}", name, err);
//! }
//! println!("{} of {} tasks succeeded", report.succeeded(), report.len());
//! ```
//!
//! # Features
//!
//! - **Bounded concurrency**: thread count never grows with input size
//! - **Collect-all errors**: one task failing never stops its siblings
//! - **Fail-fast policy**: opt-in early cancellation on the first failure
//! - **Cooperative cancellation**: unstarted tasks are reported as aborted
//! - **Panic isolation**: a panicking handler becomes a failed task
//! - **Telemetry**: per-run counters and latency percentiles (optional)

#![warn(missing_debug_implementations)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod report;
pub mod telemetry;
pub mod util;

// Re-export key types at crate root
pub use cancel::CancellationToken;
pub use config::{Config, ConfigBuilder, ErrorPolicy};
pub use error::{Error, Result, TaskError};
pub use executor::{execute, Executor, Outcome, PanicStrategy, TaskOutcome};
pub use report::{CancelReason, RunReport, RunStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_every_task_gets_one_outcome() {
        let tasks: Vec<String> = (0..50).map(|i| format!("job-{}", i)).collect();

        let report = execute(4, tasks.clone(), |_| Ok::<_, String>(())).unwrap();

        let mut ids: Vec<String> = report.outcomes().iter().map(|o| o.id.clone()).collect();
        ids.sort();
        let mut expected = tasks;
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_shared_counter() {
        let counter = Mutex::new(0);

        let report = execute(8, 0..1000, |_| {
            *counter.lock() += 1;
            Ok::<_, String>(())
        })
        .unwrap();

        assert_eq!(report.len(), 1000);
        assert_eq!(*counter.lock(), 1000);
    }

    #[test]
    fn test_always_failing_handler() {
        let report = execute(3, 0..10, |n| Err::<(), _>(format!("task {} failed", n))).unwrap();

        assert_eq!(report.status(), RunStatus::Completed);
        assert_eq!(report.failed(), 10);
        assert!(report.cancel_reason().is_none());
    }
}
