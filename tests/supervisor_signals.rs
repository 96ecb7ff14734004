//! End-to-end signal handling of the supervisor binary.
//!
//! Runs in a child process so the delivered signal cannot reach the test
//! runner's own handlers.

#![cfg(unix)]

use std::process::{Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

#[test]
fn sigterm_during_restart_delay_shuts_down_cleanly() {
    let log_dir = tempfile::tempdir().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_botvisor"))
        .args(["--max-restarts", "5", "--restart-delay", "2", "--grace", "5"])
        .arg("--log-dir")
        .arg(log_dir.path())
        .args(["--", "/bin/sh", "-c", "exit 7"])
        .env("BOT_TOKEN", "test-token")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The worker crashes immediately, so by now the supervisor is sleeping
    // out the 2s restart delay. Signal it mid-sleep.
    sleep(Duration::from_millis(600));
    let ret = unsafe { libc::kill(child.id() as i32, libc::SIGTERM) };
    assert_eq!(ret, 0, "kill failed: {}", std::io::Error::last_os_error());

    // It must exit 0 promptly instead of relaunching the worker.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            assert!(status.success(), "expected exit 0, got {status}");
            return;
        }
        assert!(
            Instant::now() < deadline,
            "supervisor did not act on SIGTERM during the restart delay"
        );
        sleep(Duration::from_millis(50));
    }
}
