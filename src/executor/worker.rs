// worker thread stuff
use super::panic_handler::PanicHandler;
use super::task::{Job, Outcome, TaskOutcome, WorkerId};
use crate::cancel::CancellationToken;
use crate::config::ErrorPolicy;
use crate::error::TaskError;
use crate::telemetry::Metrics;
use crossbeam_channel::{Receiver, Sender};
use std::time::Instant;

pub(crate) struct Worker<'run, H> {
    pub id: WorkerId,
    handler: &'run H,
    token: &'run CancellationToken,
    panic_handler: &'run PanicHandler,
    metrics: &'run Metrics,
    error_policy: ErrorPolicy,
}

impl<'run, H> Worker<'run, H> {
    pub fn new(
        id: WorkerId,
        handler: &'run H,
        token: &'run CancellationToken,
        panic_handler: &'run PanicHandler,
        metrics: &'run Metrics,
        error_policy: ErrorPolicy,
    ) -> Self {
        Self {
            id,
            handler,
            token,
            panic_handler,
            metrics,
            error_policy,
        }
    }

    // main loop: runs until the job queue is closed and drained
    pub fn run<T, R, E>(&self, jobs: Receiver<Job<T>>, outcomes: Sender<TaskOutcome<T, R, E>>)
    where
        H: Fn(&T) -> Result<R, E>,
    {
        tracing::trace!(worker = self.id, "worker started");
        let mut executed = 0usize;

        for job in jobs.iter() {
            // claimed after cancellation: report without running it
            let outcome = if self.token.is_cancelled() {
                self.metrics.record_task_aborted();
                job.abort()
            } else {
                executed += 1;
                self.execute_task(job)
            };

            if outcomes.send(outcome).is_err() {
                tracing::debug!(worker = self.id, "outcome receiver gone, worker exiting");
                break;
            }
        }

        tracing::trace!(worker = self.id, executed, "worker finished");
    }

    fn execute_task<T, R, E>(&self, job: Job<T>) -> TaskOutcome<T, R, E>
    where
        H: Fn(&T) -> Result<R, E>,
    {
        let start = Instant::now();

        let result = self.panic_handler.execute(|| (self.handler)(&job.id));

        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(Ok(value)) => Outcome::Succeeded(value),
            Ok(Err(e)) => Outcome::Failed(TaskError::Failed(e)),
            Err(panic) => {
                self.metrics.record_task_panic();
                Outcome::Failed(TaskError::Panicked(panic))
            }
        };

        self.metrics
            .record_task_execution(self.id, elapsed.as_nanos() as u64, outcome.is_success());

        if outcome.is_failure() && self.error_policy == ErrorPolicy::FailFast {
            tracing::debug!(
                worker = self.id,
                task = job.index,
                "task failed, cancelling run"
            );
            self.token.cancel();
        }

        TaskOutcome {
            index: job.index,
            id: job.id,
            outcome,
            worker: Some(self.id),
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PanicStrategy;
    use crossbeam_channel::unbounded;

    fn run_single_worker(
        jobs: Vec<u32>,
        token: &CancellationToken,
        policy: ErrorPolicy,
    ) -> Vec<TaskOutcome<u32, u32, String>> {
        let handler = |n: &u32| {
            if *n % 2 == 0 {
                Ok(*n * 10)
            } else {
                Err(format!("odd {}", n))
            }
        };
        let panic_handler = PanicHandler::new(PanicStrategy::Isolate);
        let metrics = Metrics::new(1);
        let worker = Worker::new(0, &handler, token, &panic_handler, &metrics, policy);

        let (job_tx, job_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        for (i, n) in jobs.into_iter().enumerate() {
            job_tx.send(Job::new(i, n)).unwrap();
        }
        drop(job_tx);

        worker.run(job_rx, out_tx);
        out_rx.iter().collect()
    }

    #[test]
    fn test_worker_drains_queue() {
        let token = CancellationToken::new();
        let outcomes = run_single_worker(vec![2, 3, 4], &token, ErrorPolicy::CollectAll);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].outcome, Outcome::Succeeded(20));
        assert!(outcomes[1].outcome.is_failure());
        assert_eq!(outcomes[2].outcome, Outcome::Succeeded(40));
        assert!(outcomes.iter().all(|o| o.worker == Some(0)));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_worker_aborts_after_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        let outcomes = run_single_worker(vec![2, 4], &token, ErrorPolicy::CollectAll);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.outcome.is_aborted()));
    }

    #[test]
    fn test_fail_fast_cancels_token() {
        let token = CancellationToken::new();
        let outcomes = run_single_worker(vec![2, 3, 4, 6], &token, ErrorPolicy::FailFast);

        assert!(token.is_cancelled());
        assert_eq!(outcomes[0].outcome, Outcome::Succeeded(20));
        assert!(outcomes[1].outcome.is_failure());
        assert!(outcomes[2].outcome.is_aborted());
        assert!(outcomes[3].outcome.is_aborted());
    }

    #[test]
    fn test_worker_captures_panic() {
        let token = CancellationToken::new();
        let handler = |n: &u32| -> Result<u32, String> {
            if *n == 0 {
                panic!("zero");
            }
            Ok(*n)
        };
        let panic_handler = PanicHandler::new(PanicStrategy::Isolate);
        let metrics = Metrics::new(1);
        let worker = Worker::new(
            0,
            &handler,
            &token,
            &panic_handler,
            &metrics,
            ErrorPolicy::CollectAll,
        );

        let (job_tx, job_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();
        job_tx.send(Job::new(0, 0)).unwrap();
        job_tx.send(Job::new(1, 5)).unwrap();
        drop(job_tx);

        worker.run(job_rx, out_tx);
        let outcomes: Vec<TaskOutcome<u32, u32, String>> = out_rx.iter().collect();

        assert!(outcomes[0]
            .outcome
            .error()
            .map_or(false, |e| e.is_panic()));
        assert_eq!(outcomes[1].outcome, Outcome::Succeeded(5));
        assert_eq!(panic_handler.panic_count(), 1);
    }
}
