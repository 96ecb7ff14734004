//! # botvisor
//!
//! Resilience runtime for a long-lived chat-bot worker. The crate layers four
//! independent mechanisms so that routine failures stay contained and only
//! two conditions can ever terminate the process (a missing startup
//! credential, and a worker that keeps crashing past its restart budget):
//!
//! - **Process supervision** ([`ProcessSupervisor`]): launches the
//!   application as an opaque child process, restarts crashes under a bounded
//!   [`RestartBudget`], and forwards termination signals with a grace period.
//! - **Background tasks** ([`TaskManager`]): named, cancellable units of
//!   work. Critical tasks are re-run after failure with backoff; duplicates
//!   of the same name are refused while one is live.
//! - **Event dispatch** ([`EventDispatcher`]): ordered, sequential fan-out of
//!   named events where a failing handler yields a `None` placeholder and the
//!   remaining handlers still run.
//! - **Safe connections** ([`SafeConnection`]): lazy, single-flight,
//!   retrying initialization of an external resource; every operation result
//!   comes back as an [`OperationResult`] instead of a raised error.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use botvisor::{TaskError, TaskFn, TaskManager};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tasks = TaskManager::new();
//!
//!     tasks
//!         .start_critical(
//!             "heartbeat",
//!             TaskFn::arc(|ctx: CancellationToken| async move {
//!                 loop {
//!                     tokio::select! {
//!                         _ = ctx.cancelled() => return Err(TaskError::Cancelled),
//!                         _ = tokio::time::sleep(std::time::Duration::from_secs(30)) => {
//!                             // do periodic work
//!                         }
//!                     }
//!                 }
//!             }),
//!         )
//!         .await;
//!
//!     tasks.stop_all().await;
//! }
//! ```
//!
//! The `botvisor` binary wraps an arbitrary worker command line in the
//! process supervisor; the library types are for use inside the worker
//! itself.

mod app;
mod config;
mod connect;
mod dispatch;
mod error;
pub mod logging;
mod manager;
mod policies;
mod respond;
mod supervisor;
mod tasks;

pub use app::AppContext;
pub use config::AppConfig;
pub use connect::{ConnectionState, Connector, OperationResult, SafeConnection};
pub use dispatch::{EventDispatcher, Handler, HandlerFn, HandlerRef};
pub use error::{ConnectError, RuntimeError, TaskError};
pub use manager::{TaskHandle, TaskManager, TaskState};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use respond::{RespondTarget, Responder, TargetKind};
pub use supervisor::{
    wait_for_shutdown, ExitOutcome, ProcessSupervisor, RestartBudget, ShutdownSignals, WorkerSpec,
};
pub use tasks::{Task, TaskFn, TaskRef};
