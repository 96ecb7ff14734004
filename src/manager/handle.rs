//! Per-task handle and lifecycle state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

/// Lifecycle state of a background task.
///
/// Transitions only move forward: `Pending → Running → {Done | Cancelled |
/// Failed}`. A critical restart creates a *new* handle rather than reviving a
/// terminal one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Created, not yet scheduled on the runtime.
    Pending,
    /// The unit of work is executing.
    Running,
    /// The work returned successfully.
    Done,
    /// The work observed a cancellation request and stopped.
    Cancelled,
    /// The work returned an error (captured on the handle).
    Failed,
}

impl TaskState {
    /// Terminal states are pruned from the registry and never transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Done | TaskState::Cancelled | TaskState::Failed
        )
    }
}

/// Shared handle to one registered task.
///
/// Handle identity **is** task identity: `start` on a duplicate name returns
/// the existing `Arc`, and a critical restart installs a fresh one. Compare
/// with [`Arc::ptr_eq`] to tell the two apart.
pub struct TaskHandle {
    name: Arc<str>,
    critical: bool,
    /// Cancels the whole task lineage: for a critical task this token spans
    /// restarts, so one `stop` ends the supervising loop too.
    cancel: CancellationToken,
    state: Mutex<TaskState>,
    error: Mutex<Option<String>>,
    restarts: AtomicU32,
}

impl TaskHandle {
    pub(crate) fn new(name: &str, critical: bool, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            name: Arc::from(name),
            critical,
            cancel,
            state: Mutex::new(TaskState::Pending),
            error: Mutex::new(None),
            restarts: AtomicU32::new(0),
        })
    }

    /// The registry name of this task.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this task auto-restarts on failure.
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.lock().expect("task state lock poisoned")
    }

    /// The captured error message, once the task has `Failed`.
    pub fn error(&self) -> Option<String> {
        self.error.lock().expect("task error lock poisoned").clone()
    }

    /// How many times this lineage has been restarted so far.
    ///
    /// Always zero for ordinary tasks; carried over onto each fresh handle of
    /// a critical lineage so the restart history stays inspectable.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Whether cancellation has been requested for this task.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn set_state(&self, next: TaskState) {
        *self.state.lock().expect("task state lock poisoned") = next;
    }

    pub(crate) fn set_error(&self, error: String) {
        *self.error.lock().expect("task error lock poisoned") = Some(error);
    }

    pub(crate) fn record_restarts(&self, n: u32) {
        self.restarts.store(n, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("critical", &self.critical)
            .field("state", &self.state())
            .field("restarts", &self.restarts())
            .finish()
    }
}
