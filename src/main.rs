//! Supervisor launcher: wraps a worker command line in restart-bounded
//! process supervision.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use botvisor::{logging, AppConfig, ExitOutcome, ProcessSupervisor, RestartBudget, WorkerSpec};

#[derive(Parser, Debug)]
#[command(
    name = "botvisor",
    about = "Run a worker command under restart-bounded supervision",
    version
)]
struct Args {
    /// Restarts performed before giving up.
    #[arg(long, default_value_t = 5)]
    max_restarts: u32,

    /// Seconds to wait between a crash and the relaunch.
    #[arg(long, default_value_t = 5)]
    restart_delay: u64,

    /// Seconds the worker gets to exit after a forwarded SIGTERM.
    #[arg(long, default_value_t = 10)]
    grace: u64,

    /// Directory receiving the persistent log file.
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Worker command line, after `--`.
    #[arg(required = true, last = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let _guard = match logging::init(&args.log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging in {}: {err}", args.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    // Fail fast on startup preconditions; a worker that cannot possibly run
    // must not enter the restart loop.
    if let Err(err) = AppConfig::from_env() {
        error!(error = %err, label = err.as_label(), "startup precondition failed");
        return ExitCode::FAILURE;
    }

    let spec = WorkerSpec::new(args.command[0].clone(), args.command[1..].to_vec());
    let budget = RestartBudget {
        max_restarts: args.max_restarts,
        restart_delay: Duration::from_secs(args.restart_delay),
        grace: Duration::from_secs(args.grace),
    };

    match ProcessSupervisor::new(spec, budget).run().await {
        Ok(outcome) => {
            let reason = match outcome {
                ExitOutcome::CleanExit => "worker exited cleanly",
                ExitOutcome::Terminated => "worker terminated on signal",
                ExitOutcome::ForceKilled => "worker force-killed after grace period",
            };
            info!(reason, "supervision finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, label = err.as_label(), "supervision failed");
            ExitCode::FAILURE
        }
    }
}
