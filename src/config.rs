use crate::error::{Error, Result};
use crate::executor::PanicStrategy;
use std::time::Duration;

/// How task failures affect the rest of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Every task runs regardless of sibling failures.
    #[default]
    CollectAll,
    /// The first failed task cancels the run; unstarted tasks are aborted.
    FailFast,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub num_workers: Option<usize>,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,

    /// Bound of the job channel. Defaults to the worker count.
    pub queue_capacity: Option<usize>,
    /// Bound of the outcome channel. `None` means unbounded.
    pub outcome_capacity: Option<usize>,

    pub error_policy: ErrorPolicy,
    pub panic_strategy: PanicStrategy,

    /// Cancel the run once this much time has passed since it started.
    pub run_timeout: Option<Duration>,
    /// Warn when no task finishes for this long.
    pub stall_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: None,
            thread_name_prefix: "workpool-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
            queue_capacity: None,
            outcome_capacity: None,
            error_policy: ErrorPolicy::default(),
            panic_strategy: PanicStrategy::default(),
            run_timeout: None,
            stall_timeout: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Shorthand for a default config with a fixed worker count.
    pub fn with_workers(n: usize) -> Self {
        Self {
            num_workers: Some(n),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == Some(0) {
            return Err(Error::config("num_workers must be > 0"));
        }

        if self.stack_size == Some(0) {
            return Err(Error::config("stack_size must be > 0"));
        }

        if self.outcome_capacity == Some(0) {
            return Err(Error::config("outcome_capacity must be > 0"));
        }

        if self.stall_timeout == Some(Duration::ZERO) {
            return Err(Error::config("stall_timeout must be > 0"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_workers.unwrap_or_else(num_cpus::get)
    }

    pub fn job_queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.worker_threads())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.config.num_workers = Some(n);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    pub fn outcome_capacity(mut self, capacity: usize) -> Self {
        self.config.outcome_capacity = Some(capacity);
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.config.run_timeout = Some(timeout);
        self
    }

    pub fn stall_timeout(mut self, timeout: Duration) -> Self {
        self.config.stall_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.worker_threads() >= 1);
        assert_eq!(config.error_policy, ErrorPolicy::CollectAll);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Config::builder().num_workers(0).build().unwrap_err();
        assert!(err.is_invalid_configuration());
    }

    #[test]
    fn test_large_worker_counts_accepted() {
        assert!(Config::builder().num_workers(4096).build().is_ok());
        assert!(Config::with_workers(100_000).validate().is_ok());
    }

    #[test]
    fn test_zero_capacities() {
        // a zero-capacity job queue is a rendezvous channel, which is fine
        assert!(Config::builder().queue_capacity(0).build().is_ok());
        assert!(Config::builder().outcome_capacity(0).build().is_err());
        assert!(Config::builder().stack_size(0).build().is_err());
        assert!(Config::builder()
            .stall_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_queue_capacity_follows_workers() {
        let config = Config::with_workers(3);
        assert_eq!(config.job_queue_capacity(), 3);

        let config = Config::builder()
            .num_workers(3)
            .queue_capacity(16)
            .build()
            .unwrap();
        assert_eq!(config.job_queue_capacity(), 16);
    }
}
