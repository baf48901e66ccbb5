//! Task execution infrastructure.
//!
//! This module provides the bounded executor, the worker loop that drains
//! the shared job queue, and panic isolation for task handlers.

pub mod panic_handler;
pub mod pool;
pub mod task;
pub(crate) mod worker;

pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use pool::{execute, Executor};
pub use task::{Outcome, TaskOutcome, WorkerId};
