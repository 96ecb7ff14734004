//! The async, cancellable work trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a unit of work.
pub type TaskRef = Arc<dyn Task>;

/// An asynchronous, cooperatively cancellable unit of work.
///
/// `run` may be called more than once on the same value: the manager re-runs
/// a critical task's work after a failure. Implementations must therefore
/// derive any per-run state inside `run`, not in the constructor.
///
/// Cancellation is cooperative: the work must check `ctx` at its own
/// suspension points and return [`TaskError::Cancelled`] promptly. Nothing
/// forcibly terminates an uninterruptible computation.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use botvisor::{Task, TaskError};
/// use tokio_util::sync::CancellationToken;
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Task for Heartbeat {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         while !ctx.is_cancelled() {
///             tokio::time::sleep(std::time::Duration::from_millis(50)).await;
///         }
///         Err(TaskError::Cancelled)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Executes one run of the work until completion, failure, or
    /// cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
