use super::panic_handler::PanicHandler;
use super::task::{Job, TaskOutcome};
use super::worker::Worker;
use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{CancelReason, RunReport};
use crate::telemetry::Metrics;
use crate::util::{Deadline, IdleTimer};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Select, Sender, TrySendError};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;

/// Runs a finite list of tasks on a fixed number of worker threads.
///
/// Worker threads only exist for the duration of a call to [`run`](Self::run);
/// the executor itself holds nothing but its configuration, so one executor
/// can be reused for any number of independent runs.
#[derive(Debug, Clone)]
pub struct Executor {
    config: Config,
    num_workers: usize,
}

impl Executor {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let num_workers = config.worker_threads();

        Ok(Self {
            config,
            num_workers,
        })
    }

    pub fn with_workers(n: usize) -> Result<Self> {
        Self::new(Config::with_workers(n))
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `handler` once for every task and collect all outcomes.
    ///
    /// The handler is called concurrently from several worker threads.
    pub fn run<T, R, E, I, H>(&self, tasks: I, handler: H) -> Result<RunReport<T, R, E>>
    where
        I: IntoIterator<Item = T>,
        T: Send,
        R: Send,
        E: Send,
        H: Fn(&T) -> Result<R, E> + Sync,
    {
        self.run_with_cancel(tasks, &CancellationToken::new(), handler)
    }

    /// Like [`run`](Self::run), but stops starting new tasks once `token` is
    /// cancelled. Tasks that never started are reported as aborted.
    pub fn run_with_cancel<T, R, E, I, H>(
        &self,
        tasks: I,
        token: &CancellationToken,
        handler: H,
    ) -> Result<RunReport<T, R, E>>
    where
        I: IntoIterator<Item = T>,
        T: Send,
        R: Send,
        E: Send,
        H: Fn(&T) -> Result<R, E> + Sync,
    {
        let mut tasks = tasks.into_iter().peekable();
        if tasks.peek().is_none() {
            return Ok(RunReport::empty());
        }

        let start = Instant::now();
        let run_token = token.child_token();
        let panic_handler = PanicHandler::new(self.config.panic_strategy);
        let metrics = Metrics::new(self.num_workers);
        let deadline = Deadline::new(self.config.run_timeout);

        let (job_tx, job_rx) = bounded(self.config.job_queue_capacity());
        let (outcome_tx, outcome_rx) = match self.config.outcome_capacity {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };

        tracing::debug!(workers = self.num_workers, "starting run");

        let (outcomes, stalls, timed_out) = thread::scope(|s| -> Result<_> {
            for id in 0..self.num_workers {
                let worker = Worker::new(
                    id,
                    &handler,
                    &run_token,
                    &panic_handler,
                    &metrics,
                    self.config.error_policy,
                );
                let jobs = job_rx.clone();
                let outcomes = outcome_tx.clone();

                // on failure the already spawned workers see the queue close and exit
                self.spawn(s, format!("{}-{}", self.config.thread_name_prefix, id), move || {
                    worker.run(jobs, outcomes)
                })?;
            }
            drop(job_rx);

            let collector = self.spawn(
                s,
                format!("{}-collect", self.config.thread_name_prefix),
                || collect(outcome_rx, &deadline, &run_token, self.config.stall_timeout),
            )?;

            // the calling thread feeds the queue, so `tasks` never crosses threads
            Dispatcher {
                jobs: job_tx,
                outcomes: outcome_tx,
                run_token: &run_token,
                caller_token: token,
                metrics: &metrics,
            }
            .dispatch(tasks);

            collector
                .join()
                .map_err(|_| Error::executor("outcome collector panicked"))
        })?;

        let cancel_reason = if token.is_cancelled() {
            Some(CancelReason::Caller)
        } else if timed_out {
            Some(CancelReason::Timeout)
        } else if run_token.is_cancelled() {
            Some(CancelReason::FailFast)
        } else {
            None
        };

        let elapsed = start.elapsed();
        tracing::debug!(
            tasks = outcomes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            cancelled = ?cancel_reason,
            "run finished"
        );

        Ok(RunReport::new(
            outcomes,
            cancel_reason,
            elapsed,
            stalls,
            metrics.snapshot(),
        ))
    }

    fn spawn<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        name: String,
        f: F,
    ) -> Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let mut builder = thread::Builder::new().name(name);

        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        builder
            .spawn_scoped(scope, f)
            .map_err(|e| Error::executor(format!("spawn failed: {}", e)))
    }
}

/// Feeds tasks into the job queue in submission order.
struct Dispatcher<'run, T, R, E> {
    jobs: Sender<Job<T>>,
    outcomes: Sender<TaskOutcome<T, R, E>>,
    run_token: &'run CancellationToken,
    caller_token: &'run CancellationToken,
    metrics: &'run Metrics,
}

impl<T, R, E> Dispatcher<'_, T, R, E> {
    fn dispatch<I>(self, tasks: I)
    where
        I: Iterator<Item = T>,
    {
        let mut tasks = tasks.enumerate().map(|(index, id)| Job::new(index, id));
        let mut dispatched = 0usize;

        while let Some(job) = tasks.next() {
            if let Err(job) = self.send(job) {
                // stop dispatching; whatever is left never starts
                let mut aborted = 0usize;
                for job in std::iter::once(job).chain(tasks.by_ref()) {
                    self.metrics.record_task_aborted();
                    aborted += 1;
                    if self.outcomes.send(job.abort()).is_err() {
                        break;
                    }
                }
                tracing::debug!(dispatched, aborted, "dispatch stopped by cancellation");
                return;
            }
            dispatched += 1;
        }

        tracing::trace!(dispatched, "all tasks dispatched");
        // dropping `self.jobs` closes the queue
    }

    /// Blocks until the job is queued or the run is cancelled.
    fn send(&self, mut job: Job<T>) -> std::result::Result<(), Job<T>> {
        loop {
            if self.run_token.is_cancelled() {
                return Err(job);
            }

            match self.jobs.try_send(job) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Disconnected(j)) => return Err(j),
                Err(TrySendError::Full(j)) => {
                    job = j;
                    let mut sel = Select::new();
                    sel.send(&self.jobs);
                    sel.recv(self.run_token.signal());
                    sel.recv(self.caller_token.signal());
                    sel.ready();
                }
            }
        }
    }
}

/// Drain outcomes until every worker and the dispatcher are done.
///
/// Returns the outcomes, the number of stalls seen and whether the run
/// deadline fired.
fn collect<T, R, E>(
    outcome_rx: Receiver<TaskOutcome<T, R, E>>,
    deadline: &Deadline,
    run_token: &CancellationToken,
    stall_timeout: Option<std::time::Duration>,
) -> (Vec<TaskOutcome<T, R, E>>, u64, bool) {
    let mut outcomes = Vec::new();
    let mut idle = IdleTimer::new(stall_timeout);
    let mut stalls = 0u64;
    let mut timed_out = false;

    loop {
        select! {
            recv(outcome_rx) -> msg => match msg {
                Ok(outcome) => {
                    outcomes.push(outcome);
                    idle.reset();
                }
                // all senders dropped: workers and dispatcher are done
                Err(_) => break,
            },
            recv(deadline.receiver()) -> _ => {
                tracing::warn!(completed = outcomes.len(), "run timed out, cancelling");
                timed_out = true;
                run_token.cancel();
            },
            default(idle.remaining()) => {
                if idle.is_armed() {
                    stalls += 1;
                    tracing::warn!(
                        idle_ms = idle.idle_for().as_millis() as u64,
                        completed = outcomes.len(),
                        "no task finished within stall timeout"
                    );
                }
                idle.reset();
            },
        }
    }

    (outcomes, stalls, timed_out)
}

/// Run `tasks` on `worker_count` threads with the default configuration.
///
/// Fails with [`Error::InvalidConfiguration`] before calling `handler` at all
/// if `worker_count` is zero.
pub fn execute<T, R, E, I, H>(worker_count: usize, tasks: I, handler: H) -> Result<RunReport<T, R, E>>
where
    I: IntoIterator<Item = T>,
    T: Send,
    R: Send,
    E: Send,
    H: Fn(&T) -> Result<R, E> + Sync,
{
    Executor::with_workers(worker_count)?.run(tasks, handler)
}
