//! Error types used by the botvisor runtime.
//!
//! Three enums cover the three failure domains:
//!
//! - [`RuntimeError`]: failures of the outer runtime (startup preconditions,
//!   process supervision).
//! - [`TaskError`]: failures of individual units of work (background tasks
//!   and event handlers).
//! - [`ConnectError`]: failures while establishing or using an external
//!   resource through [`SafeConnection`](crate::SafeConnection).
//!
//! Only two conditions are allowed to terminate the process: a missing
//! startup credential and an exhausted restart budget. Everything else is
//! contained at a component boundary and reported through logs or return
//! values.

use thiserror::Error;

/// Errors raised by the outer runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A required environment value was absent at startup.
    ///
    /// Fatal: the process must exit before entering supervision.
    #[error("missing required environment variable {name}")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },

    /// The supervised worker kept crashing and the restart budget ran out.
    ///
    /// Fatal: the supervisor gives up and exits nonzero.
    #[error("worker restart budget exhausted after {restarts} restarts (last exit code {last_code:?})")]
    RestartsExhausted {
        /// Number of restarts performed before giving up.
        restarts: u32,
        /// Exit code of the final crash, if the worker exited normally.
        last_code: Option<i32>,
    },

    /// The worker process could not be spawned or waited on.
    #[error("worker process error: {0}")]
    Worker(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::MissingEnv { .. } => "missing_env",
            RuntimeError::RestartsExhausted { .. } => "restarts_exhausted",
            RuntimeError::Worker(_) => "worker_io",
        }
    }

    /// True for the conditions that map to process exit code 1.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::MissingEnv { .. } | RuntimeError::RestartsExhausted { .. }
        )
    }
}

/// Errors produced by units of work: background tasks and event handlers.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TaskError {
    /// The work failed; a critical task will be restarted after this.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The work observed its cancellation token and stopped.
    ///
    /// Not an error for reporting purposes; never triggers a restart.
    #[error("cancelled")]
    Cancelled,
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Cancelled => "task_cancelled",
        }
    }

    /// Whether a critical task should be restarted after this outcome.
    ///
    /// Cancellation is a deliberate stop, never restarted.
    pub fn is_restartable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}

/// Errors raised while connecting to or operating on an external resource.
///
/// These never cross the [`SafeConnection`](crate::SafeConnection) boundary
/// raw: init failures surface as `false`, operation failures as an
/// [`OperationResult`](crate::OperationResult) with `success == false`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Establishing the underlying resource handle failed.
    #[error("connect failed: {error}")]
    Connect {
        /// Driver-level error message.
        error: String,
    },

    /// The liveness check on a fresh handle failed.
    #[error("liveness check failed: {error}")]
    Ping {
        /// Driver-level error message.
        error: String,
    },

    /// An operation was attempted before the connection reached `Ready`.
    #[error("connection not ready")]
    NotReady,

    /// An operation on an established handle failed.
    #[error("operation failed: {error}")]
    Operation {
        /// Driver-level error message.
        error: String,
    },
}

impl ConnectError {
    /// Convenience constructor for [`ConnectError::Operation`].
    pub fn operation(error: impl Into<String>) -> Self {
        ConnectError::Operation {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectError::Connect { .. } => "connect_failed",
            ConnectError::Ping { .. } => "ping_failed",
            ConnectError::NotReady => "not_ready",
            ConnectError::Operation { .. } => "operation_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restartable_outcomes() {
        assert!(TaskError::fail("boom").is_restartable());
        assert!(!TaskError::Cancelled.is_restartable());
    }

    #[test]
    fn fatal_runtime_errors() {
        assert!(RuntimeError::MissingEnv { name: "BOT_TOKEN" }.is_fatal());
        assert!(RuntimeError::RestartsExhausted {
            restarts: 3,
            last_code: Some(1)
        }
        .is_fatal());
        assert!(!RuntimeError::Worker(std::io::Error::other("spawn")).is_fatal());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::Cancelled.as_label(), "task_cancelled");
        assert_eq!(ConnectError::NotReady.as_label(), "not_ready");
    }
}
