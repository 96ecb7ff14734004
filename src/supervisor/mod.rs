//! Process supervisor.
//!
//! [`ProcessSupervisor`] treats the whole application as one opaque worker
//! process: it launches the worker, waits for it to exit, classifies the
//! exit, and restarts under a bounded [`RestartBudget`]. Termination signals
//! received by the supervisor are forwarded to the worker, which gets a
//! bounded grace period before being force-killed.
//!
//! ## State machine
//! ```text
//! Starting → Running → exit 0            → Terminated (exit 0)
//!                    → exit ≠ 0, budget  → Restarting → Running
//!                    → exit ≠ 0, no budget → GivingUp (exit 1)
//!                    → signal            → SIGTERM → grace → [SIGKILL] → exit 0
//! ```

mod process;
mod signal;

pub use process::{ExitOutcome, ProcessSupervisor, RestartBudget, WorkerSpec};
pub use signal::{wait_for_shutdown, ShutdownSignals};
