pub use crate::cancel::CancellationToken;
pub use crate::config::{Config, ConfigBuilder, ErrorPolicy};
pub use crate::error::{Error, Result, TaskError};
pub use crate::executor::{execute, Executor, Outcome, PanicStrategy, TaskOutcome};
pub use crate::report::{CancelReason, RunReport, RunStatus};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::MetricsSnapshot;
