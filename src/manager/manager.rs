//! Named registry of concurrent background tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::TaskError;
use crate::manager::handle::{TaskHandle, TaskState};
use crate::policies::BackoffPolicy;
use crate::tasks::TaskRef;

/// Outcome of one run of a task's work, as seen by completion handling.
enum Outcome {
    Done,
    Cancelled,
    Failed(String),
}

/// Tracks named background tasks and supervises the critical ones.
///
/// One instance per process, owned by the application context. All methods
/// take `&self`; the registry is behind an async `RwLock` and no lock is held
/// across a suspension point inside a mutation.
pub struct TaskManager {
    tasks: RwLock<HashMap<String, Arc<TaskHandle>>>,
    /// Parent of every task lineage token; cancelled on shutdown.
    root: CancellationToken,
    /// Delay schedule between critical-task restarts.
    backoff: BackoffPolicy,
    /// Restart cap per critical lineage; `0` = unbounded.
    restart_cap: u32,
}

impl TaskManager {
    /// Creates a manager with default backoff and no critical restart cap.
    pub fn new() -> Arc<Self> {
        Self::with_policy(BackoffPolicy::default(), 0)
    }

    /// Creates a manager with an explicit critical-restart policy.
    ///
    /// `restart_cap = 0` restarts critical tasks indefinitely (backoff still
    /// applies); a nonzero cap stops the lineage after that many restarts.
    pub fn with_policy(backoff: BackoffPolicy, restart_cap: u32) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            root: CancellationToken::new(),
            backoff,
            restart_cap,
        })
    }

    /// Starts a named background task.
    ///
    /// If a non-terminal task is already registered under `name`, logs a
    /// warning and returns the existing handle unchanged; the work is **not**
    /// scheduled a second time. Callers that need to distinguish the two
    /// cases compare handle identity with [`Arc::ptr_eq`].
    pub async fn start(self: &Arc<Self>, name: &str, task: TaskRef) -> Arc<TaskHandle> {
        self.start_inner(name, task, false).await
    }

    /// Starts a named critical task: after a failure (not a cancellation) the
    /// work is re-run under the same name with backoff between restarts.
    pub async fn start_critical(self: &Arc<Self>, name: &str, task: TaskRef) -> Arc<TaskHandle> {
        self.start_inner(name, task, true).await
    }

    async fn start_inner(
        self: &Arc<Self>,
        name: &str,
        task: TaskRef,
        critical: bool,
    ) -> Arc<TaskHandle> {
        let mut tasks = self.tasks.write().await;
        if let Some(existing) = tasks.get(name) {
            if !existing.state().is_terminal() {
                warn!(task = name, "task already running; ignoring duplicate start");
                return Arc::clone(existing);
            }
        }

        let lineage = self.root.child_token();
        let handle = TaskHandle::new(name, critical, lineage.clone());
        tasks.insert(name.to_string(), Arc::clone(&handle));
        drop(tasks);

        info!(task = name, critical, "task started");

        let mgr = Arc::clone(self);
        let owned = name.to_string();
        let spawned = Arc::clone(&handle);
        if critical {
            tokio::spawn(async move {
                mgr.supervise_critical(owned, task, lineage, spawned).await;
            });
        } else {
            tokio::spawn(async move {
                mgr.run_ordinary(owned, task, spawned).await;
            });
        }
        handle
    }

    /// Requests cooperative cancellation of the named task.
    ///
    /// Returns `true` if a non-terminal task was found and signalled,
    /// `false` otherwise; an unknown name is not an error.
    pub async fn stop(&self, name: &str) -> bool {
        let tasks = self.tasks.read().await;
        match tasks.get(name) {
            Some(handle) if !handle.state().is_terminal() => {
                handle.request_cancel();
                info!(task = name, "task stop requested");
                true
            }
            _ => false,
        }
    }

    /// Requests cancellation of every non-terminal task; returns how many
    /// were signalled.
    pub async fn stop_all(&self) -> usize {
        let tasks = self.tasks.read().await;
        let mut stopped = 0;
        for handle in tasks.values() {
            if !handle.state().is_terminal() {
                handle.request_cancel();
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!(count = stopped, "stop requested for all active tasks");
        }
        stopped
    }

    /// Snapshot of the non-terminal tasks, by name.
    ///
    /// Terminal tasks are pruned by their own completion handling; this read
    /// merely filters out any that have finished but not been pruned yet.
    pub async fn active(&self) -> HashMap<String, Arc<TaskHandle>> {
        let tasks = self.tasks.read().await;
        tasks
            .iter()
            .filter(|(_, h)| !h.state().is_terminal())
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    /// Sorted names of the non-terminal tasks.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active().await.into_keys().collect();
        names.sort_unstable();
        names
    }

    // ---- completion handling ----

    async fn run_ordinary(self: Arc<Self>, name: String, task: TaskRef, handle: Arc<TaskHandle>) {
        handle.set_state(TaskState::Running);
        let res = task.run(handle.cancel_token().child_token()).await;
        let outcome = classify(res, &handle);
        self.complete(&name, &handle, outcome).await;
    }

    /// Explicit supervising loop for one critical lineage.
    ///
    /// Holds the restart count and backoff state here, in one inspectable
    /// place, instead of re-entering `start` recursively. The lineage token
    /// is shared by every handle of the lineage, so a single `stop` ends both
    /// the current run and the loop.
    async fn supervise_critical(
        self: Arc<Self>,
        name: String,
        task: TaskRef,
        lineage: CancellationToken,
        first: Arc<TaskHandle>,
    ) {
        let mut handle = first;
        let mut restarts: u32 = 0;

        loop {
            handle.set_state(TaskState::Running);
            let res = task.run(lineage.child_token()).await;
            let outcome = classify(res, &handle);

            let err = match outcome {
                Outcome::Failed(e) if !lineage.is_cancelled() => e,
                other => {
                    self.complete(&name, &handle, other).await;
                    return;
                }
            };

            if self.restart_cap != 0 && restarts >= self.restart_cap {
                self.complete(&name, &handle, Outcome::Failed(err)).await;
                error!(
                    task = %name,
                    restarts,
                    cap = self.restart_cap,
                    "critical task restart cap reached; giving up on lineage"
                );
                return;
            }

            let delay = self.backoff.delay_for(restarts);
            restarts += 1;
            warn!(
                task = %name,
                restart = restarts,
                delay_ms = delay.as_millis() as u64,
                "critical task failed; restarting after backoff"
            );

            // Failed handle out, replacement in, under one registry lock:
            // a concurrent stop_all must never observe the lineage missing.
            // The replacement sleeps out the backoff before running.
            handle = match self
                .replace_failed(&name, &handle, err, lineage.clone(), restarts)
                .await
            {
                Some(h) => h,
                None => return,
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = lineage.cancelled() => {
                    info!(task = %name, "critical task lineage cancelled during backoff");
                    self.complete(&name, &handle, Outcome::Cancelled).await;
                    return;
                }
            }
        }
    }

    /// Marks the failed run terminal and installs the lineage's fresh handle
    /// in one registry critical section.
    ///
    /// Bails out if the registry entry is no longer this lineage's handle;
    /// the name belongs to someone else now.
    async fn replace_failed(
        &self,
        name: &str,
        failed: &Arc<TaskHandle>,
        error: String,
        lineage: CancellationToken,
        restarts: u32,
    ) -> Option<Arc<TaskHandle>> {
        let mut tasks = self.tasks.write().await;
        failed.set_error(error.clone());
        failed.set_state(TaskState::Failed);
        error!(task = name, error = %error, "task failed");

        let ours = tasks
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, failed));
        if !ours {
            warn!(
                task = name,
                "registry entry no longer this lineage; abandoning restart"
            );
            return None;
        }

        let handle = TaskHandle::new(name, true, lineage);
        handle.record_restarts(restarts);
        tasks.insert(name.to_string(), Arc::clone(&handle));
        info!(task = name, restart = restarts, "critical task restarted");
        Some(handle)
    }

    /// Logs the outcome, marks the handle terminal, and prunes the registry
    /// entry (only if it is still this handle; a replacement stays put).
    async fn complete(&self, name: &str, handle: &Arc<TaskHandle>, outcome: Outcome) {
        match outcome {
            Outcome::Done => {
                handle.set_state(TaskState::Done);
                info!(task = name, "task completed");
            }
            Outcome::Cancelled => {
                handle.set_state(TaskState::Cancelled);
                info!(task = name, "task cancelled");
            }
            Outcome::Failed(err) => {
                handle.set_error(err.clone());
                handle.set_state(TaskState::Failed);
                error!(task = name, error = %err, "task failed");
            }
        }

        let mut tasks = self.tasks.write().await;
        if let Some(current) = tasks.get(name) {
            if Arc::ptr_eq(current, handle) {
                tasks.remove(name);
            }
        }
    }
}

fn classify(res: Result<(), TaskError>, handle: &TaskHandle) -> Outcome {
    match res {
        Ok(()) => {
            // Work that exits Ok after a stop request honored the request.
            if handle.is_cancel_requested() {
                Outcome::Cancelled
            } else {
                Outcome::Done
            }
        }
        Err(TaskError::Cancelled) => Outcome::Cancelled,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}
