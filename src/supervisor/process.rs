//! Worker process launch, exit classification, and bounded restart.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{error, info, warn};

use crate::error::RuntimeError;
use crate::supervisor::signal;

/// Command line of the supervised worker.
#[derive(Clone, Debug)]
pub struct WorkerSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl WorkerSpec {
    /// Creates a worker spec from a program and its arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Bounded restart policy for the worker process.
#[derive(Clone, Copy, Debug)]
pub struct RestartBudget {
    /// Restarts performed before giving up.
    pub max_restarts: u32,
    /// Sleep between a crash and the relaunch.
    pub restart_delay: Duration,
    /// How long the worker gets to exit after a forwarded SIGTERM.
    pub grace: Duration,
}

impl Default for RestartBudget {
    /// 5 restarts, 5s apart, 10s shutdown grace.
    fn default() -> Self {
        Self {
            max_restarts: 5,
            restart_delay: Duration::from_secs(5),
            grace: Duration::from_secs(10),
        }
    }
}

/// How a supervision run ended without exhausting the budget.
///
/// All variants map to process exit code 0; only
/// [`RuntimeError::RestartsExhausted`] maps to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The worker exited 0 on its own.
    CleanExit,
    /// A termination signal arrived and the worker stopped within the grace
    /// period.
    Terminated,
    /// A termination signal arrived, the worker ignored it, and it was
    /// force-killed after the grace period.
    ForceKilled,
}

enum Waited {
    Exited(ExitStatus),
    Signalled(&'static str),
}

/// Launches and restarts one worker process under a [`RestartBudget`].
pub struct ProcessSupervisor {
    spec: WorkerSpec,
    budget: RestartBudget,
}

impl ProcessSupervisor {
    /// Creates a supervisor for the given worker and budget.
    pub fn new(spec: WorkerSpec, budget: RestartBudget) -> Self {
        Self { spec, budget }
    }

    /// Runs the worker until it exits cleanly, a termination signal is
    /// handled, or the restart budget runs out.
    ///
    /// Every crash is logged with its exit code before the restart decision;
    /// reaching the budget is the only non-retried failure.
    pub async fn run(&self) -> Result<ExitOutcome, RuntimeError> {
        let mut restarts: u32 = 0;
        // Installed once and held across iterations: a signal landing during
        // the restart delay must still be observed, not swallowed.
        let mut signals = signal::ShutdownSignals::new()?;

        loop {
            let mut child = self.spawn()?;
            info!(
                program = %self.spec.program,
                pid = child.id(),
                "worker started"
            );

            let waited = tokio::select! {
                status = child.wait() => Waited::Exited(status?),
                sig = signals.recv() => Waited::Signalled(sig),
            };

            match waited {
                Waited::Exited(status) if status.success() => {
                    info!("worker exited cleanly");
                    return Ok(ExitOutcome::CleanExit);
                }
                Waited::Exited(status) => {
                    let code = status.code();
                    error!(exit_code = code, "worker crashed");

                    if restarts >= self.budget.max_restarts {
                        error!(restarts, "restart budget exhausted; giving up");
                        return Err(RuntimeError::RestartsExhausted {
                            restarts,
                            last_code: code,
                        });
                    }

                    restarts += 1;
                    warn!(
                        restart = restarts,
                        max_restarts = self.budget.max_restarts,
                        delay_ms = self.budget.restart_delay.as_millis() as u64,
                        "restarting worker"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.budget.restart_delay) => {}
                        sig = signals.recv() => {
                            info!(
                                signal = sig,
                                "termination signal received during restart delay; shutting down"
                            );
                            return Ok(ExitOutcome::Terminated);
                        }
                    }
                }
                Waited::Signalled(sig) => {
                    info!(signal = sig, "termination signal received; forwarding to worker");
                    return self.graceful_stop(child).await;
                }
            }
        }
    }

    fn spawn(&self) -> Result<Child, RuntimeError> {
        let child = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .kill_on_drop(true)
            .spawn()?;
        Ok(child)
    }

    /// Forwards SIGTERM, waits out the grace period, then force-kills.
    async fn graceful_stop(&self, mut child: Child) -> Result<ExitOutcome, RuntimeError> {
        send_term(&mut child);

        match tokio::time::timeout(self.budget.grace, child.wait()).await {
            Ok(status) => {
                let status = status?;
                info!(exit_code = status.code(), "worker stopped within grace period");
                Ok(ExitOutcome::Terminated)
            }
            Err(_elapsed) => {
                warn!(
                    grace_ms = self.budget.grace.as_millis() as u64,
                    "worker ignored termination; force-killing"
                );
                child.kill().await?;
                Ok(ExitOutcome::ForceKilled)
            }
        }
    }
}

#[cfg(unix)]
fn send_term(child: &mut Child) {
    // id() is None once the child has already been reaped.
    if let Some(pid) = child.id() {
        let ret = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if ret != 0 {
            warn!(
                pid,
                error = %std::io::Error::last_os_error(),
                "failed to forward SIGTERM"
            );
        }
    }
}

#[cfg(not(unix))]
fn send_term(child: &mut Child) {
    let _ = child.start_kill();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> WorkerSpec {
        WorkerSpec::new("/bin/sh", vec!["-c".into(), script.into()])
    }

    fn budget(max_restarts: u32, delay: Duration) -> RestartBudget {
        RestartBudget {
            max_restarts,
            restart_delay: delay,
            grace: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn clean_exit_ends_supervision() {
        let sup = ProcessSupervisor::new(sh("exit 0"), budget(3, Duration::from_millis(10)));
        assert_eq!(sup.run().await.unwrap(), ExitOutcome::CleanExit);
    }

    #[tokio::test]
    async fn crashing_worker_exhausts_the_budget() {
        let delay = Duration::from_millis(50);
        let sup = ProcessSupervisor::new(sh("exit 3"), budget(2, delay));

        let started = Instant::now();
        let err = sup.run().await.unwrap_err();
        let elapsed = started.elapsed();

        match err {
            RuntimeError::RestartsExhausted {
                restarts,
                last_code,
            } => {
                assert_eq!(restarts, 2);
                assert_eq!(last_code, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
        // One restart delay per performed restart.
        assert!(elapsed >= delay, "elapsed {elapsed:?} below a single delay");
    }

    #[tokio::test]
    async fn zero_budget_gives_up_on_first_crash() {
        let sup = ProcessSupervisor::new(sh("exit 1"), budget(0, Duration::from_millis(10)));
        match sup.run().await.unwrap_err() {
            RuntimeError::RestartsExhausted { restarts, .. } => assert_eq!(restarts, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn worker_recovering_after_one_crash_ends_clean() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran-once");
        let script = format!(
            "if [ -f {m} ]; then exit 0; else touch {m}; exit 1; fi",
            m = marker.display()
        );
        let sup = ProcessSupervisor::new(sh(&script), budget(3, Duration::from_millis(10)));
        assert_eq!(sup.run().await.unwrap(), ExitOutcome::CleanExit);
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_worker_error() {
        let sup = ProcessSupervisor::new(
            WorkerSpec::new("/nonexistent/botvisor-worker", vec![]),
            budget(1, Duration::from_millis(10)),
        );
        assert!(matches!(
            sup.run().await.unwrap_err(),
            RuntimeError::Worker(_)
        ));
    }
}
