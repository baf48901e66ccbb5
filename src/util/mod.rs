pub mod timer;

pub use timer::{Deadline, IdleTimer};
