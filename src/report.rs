//! Aggregated result of a run.

use crate::error::TaskError;
use crate::executor::{Outcome, TaskOutcome};
use crate::telemetry::MetricsSnapshot;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Overall status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every task got to run. Some may still have failed.
    Completed,
    /// At least one task was never started because the run was cancelled.
    Aborted,
}

/// What stopped a run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Caller,
    Timeout,
    FailFast,
}

/// Outcomes of every submitted task, in completion order.
#[derive(Debug)]
pub struct RunReport<T, R, E> {
    outcomes: Vec<TaskOutcome<T, R, E>>,
    cancel_reason: Option<CancelReason>,
    elapsed: Duration,
    stalls: u64,
    metrics: MetricsSnapshot,
}

impl<T, R, E> RunReport<T, R, E> {
    pub(crate) fn new(
        outcomes: Vec<TaskOutcome<T, R, E>>,
        cancel_reason: Option<CancelReason>,
        elapsed: Duration,
        stalls: u64,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            outcomes,
            cancel_reason,
            elapsed,
            stalls,
            metrics,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(
            Vec::new(),
            None,
            Duration::ZERO,
            0,
            MetricsSnapshot::default(),
        )
    }

    pub fn status(&self) -> RunStatus {
        if self.outcomes.iter().any(|o| o.outcome.is_aborted()) {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        }
    }

    /// Set when the run was cancelled, even if no task ended up aborted.
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        self.cancel_reason
    }

    /// True when every task ran and succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.outcome.is_success())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::is_success)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    pub fn aborted(&self) -> usize {
        self.count(Outcome::is_aborted)
    }

    fn count(&self, pred: impl Fn(&Outcome<R, E>) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    /// Outcomes in the order tasks finished.
    pub fn outcomes(&self) -> &[TaskOutcome<T, R, E>] {
        &self.outcomes
    }

    pub fn in_submission_order(&self) -> Vec<&TaskOutcome<T, R, E>> {
        let mut ordered: Vec<_> = self.outcomes.iter().collect();
        ordered.sort_by_key(|o| o.index);
        ordered
    }

    pub fn failures(&self) -> impl Iterator<Item = (&T, &TaskError<E>)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.outcome.error().map(|e| (&o.id, e)))
    }

    /// First failure by completion order.
    pub fn first_error(&self) -> Option<(&T, &TaskError<E>)> {
        self.failures().next()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of times the stall timeout elapsed without any task finishing.
    pub fn stalls(&self) -> u64 {
        self.stalls
    }

    pub fn metrics(&self) -> &MetricsSnapshot {
        &self.metrics
    }

    pub fn into_outcomes(self) -> Vec<TaskOutcome<T, R, E>> {
        self.outcomes
    }
}

impl<T: PartialEq, R, E> RunReport<T, R, E> {
    /// Outcome of the first task submitted with this id.
    pub fn get(&self, id: &T) -> Option<&Outcome<R, E>> {
        self.outcomes
            .iter()
            .filter(|o| &o.id == id)
            .min_by_key(|o| o.index)
            .map(|o| &o.outcome)
    }
}

impl<T: Eq + Hash, R, E> RunReport<T, R, E> {
    /// Index outcomes by task id. With duplicate ids the last submitted wins.
    pub fn into_map(self) -> HashMap<T, Outcome<R, E>> {
        let mut ordered = self.outcomes;
        ordered.sort_by_key(|o| o.index);
        ordered.into_iter().map(|o| (o.id, o.outcome)).collect()
    }
}
