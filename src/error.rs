use crate::executor::PanicInfo;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that stop a run before or while it starts.
///
/// Failures of individual tasks are never reported through this type; they
/// are carried as [`TaskError`] inside the run report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration(_))
    }
}

/// Why a single task did not succeed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("task panicked: {0}")]
    Panicked(PanicInfo),
}

impl<E> TaskError<E> {
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    /// The handler's own error, if the task returned one.
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            TaskError::Failed(e) => Some(e),
            TaskError::Panicked(_) => None,
        }
    }
}
