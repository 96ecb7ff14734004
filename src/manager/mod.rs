//! Background task manager.
//!
//! [`TaskManager`] tracks named concurrent units of work:
//! - `start` refuses duplicate concurrent starts of the same logical task,
//! - `stop` / `stop_all` request cooperative cancellation,
//! - terminal tasks are pruned by their own completion handling, not by reads,
//! - tasks started as *critical* are re-run under the same name after a
//!   failure by an explicit supervising loop with inspectable restart count
//!   and backoff (never after cancellation).
//!
//! ## Architecture
//! ```text
//! start(name, work) ──► registry: name → TaskHandle
//!                             │
//!                             ├─ ordinary: run once ─► log ─► prune
//!                             │
//!                             └─ critical: loop {
//!                                  run ─► Ok/Cancelled ─► log ─► prune, exit
//!                                      └─ Err ─► log, prune
//!                                               ├─ cap reached ─► exit
//!                                               └─ backoff sleep (cancellable)
//!                                                  ─► fresh handle, same name
//!                                }
//! ```

mod handle;
#[allow(clippy::module_inception)]
mod manager;

pub use handle::{TaskHandle, TaskState};
pub use manager::TaskManager;
