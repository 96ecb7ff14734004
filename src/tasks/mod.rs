//! Units of work scheduled by the [`TaskManager`](crate::TaskManager).
//!
//! [`Task`] is the async, cancellable work trait; [`TaskFn`] adapts a closure
//! into one; [`TaskRef`] is the shared handle type used across the runtime.

mod task;
mod task_fn;

pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
