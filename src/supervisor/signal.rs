//! OS termination-signal handling for the supervisor.

use std::io;

/// Termination-signal listener that survives across waits.
///
/// The underlying streams are installed once at construction; a signal that
/// arrives between two `recv` calls is buffered by the runtime rather than
/// falling through to the default disposition. The supervisor holds one of
/// these for its whole run so that signals landing during a restart delay
/// are still observed.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Installs listeners for `SIGINT`, `SIGTERM`, and `SIGQUIT`.
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Waits for the next termination signal and returns a label naming it,
    /// for logs.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigquit.recv() => "SIGQUIT",
        }
    }
}

/// Termination-signal listener that survives across waits.
///
/// Outside Unix only Ctrl-C is available.
#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    /// Creates the listener.
    pub fn new() -> io::Result<Self> {
        Ok(Self)
    }

    /// Waits for the next Ctrl-C and returns a label naming it, for logs.
    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}

/// Waits until the process receives a termination signal and returns a label
/// naming it, for logs.
///
/// One-shot convenience over [`ShutdownSignals`]; callers that wait more than
/// once should hold a `ShutdownSignals` instead, so no signal slips between
/// the waits.
pub async fn wait_for_shutdown() -> io::Result<&'static str> {
    Ok(ShutdownSignals::new()?.recv().await)
}
