//! Task representation and outcomes.

use crate::error::TaskError;
use std::time::Duration;

pub type WorkerId = usize;

/// A task as it travels through the job queue.
///
/// The id is moved in by value so each worker owns the data it works on.
#[derive(Debug)]
pub(crate) struct Job<T> {
    pub(crate) index: usize,
    pub(crate) id: T,
}

impl<T> Job<T> {
    pub(crate) fn new(index: usize, id: T) -> Self {
        Job { index, id }
    }

    pub(crate) fn abort<R, E>(self) -> TaskOutcome<T, R, E> {
        TaskOutcome {
            index: self.index,
            id: self.id,
            outcome: Outcome::Aborted,
            worker: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of one task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R, E> {
    Succeeded(R),
    Failed(TaskError<E>),
    /// The run was cancelled before the task started.
    Aborted,
}

impl<R, E> Outcome<R, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted)
    }

    pub fn error(&self) -> Option<&TaskError<E>> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_result(&self) -> Option<Result<&R, &TaskError<E>>> {
        match self {
            Outcome::Succeeded(r) => Some(Ok(r)),
            Outcome::Failed(e) => Some(Err(e)),
            Outcome::Aborted => None,
        }
    }
}

/// Outcome of a task together with where and how long it ran.
#[derive(Debug, Clone)]
pub struct TaskOutcome<T, R, E> {
    /// Position of the task in the submitted sequence.
    pub index: usize,
    pub id: T,
    pub outcome: Outcome<R, E>,
    /// Worker that ran the handler; `None` for aborted tasks.
    pub worker: Option<WorkerId>,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_job() {
        let outcome: TaskOutcome<&str, u32, String> = Job::new(4, "a").abort();
        assert_eq!(outcome.index, 4);
        assert_eq!(outcome.id, "a");
        assert!(outcome.outcome.is_aborted());
        assert!(outcome.worker.is_none());
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: Outcome<u32, &str> = Outcome::Succeeded(7);
        assert!(ok.is_success());
        assert_eq!(ok.as_result(), Some(Ok(&7)));

        let failed: Outcome<u32, &str> = Outcome::Failed(TaskError::Failed("disk full"));
        assert!(failed.is_failure());
        assert_eq!(
            failed.error().and_then(|e| e.handler_error()),
            Some(&"disk full")
        );

        let aborted: Outcome<u32, &str> = Outcome::Aborted;
        assert!(aborted.as_result().is_none());
    }
}
