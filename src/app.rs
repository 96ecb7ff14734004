//! Shared application context wiring the runtime pieces together.

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::connect::{Connector, SafeConnection};
use crate::dispatch::EventDispatcher;
use crate::manager::TaskManager;

/// Everything a feature module needs, behind one `Arc`.
///
/// `P` and `R` are the event payload and handler result types of the
/// dispatcher; the connector type fixes which external resource the safe
/// connection wraps.
pub struct AppContext<C, P, R>
where
    C: Connector,
    P: Clone + Send + 'static,
    R: Send,
{
    /// Startup configuration, read once.
    pub config: AppConfig,
    /// Named background tasks.
    pub tasks: Arc<TaskManager>,
    /// Event handler registry.
    pub events: Arc<EventDispatcher<P, R>>,
    /// Lazily initialized external resource.
    pub db: Arc<SafeConnection<C>>,
}

impl<C, P, R> AppContext<C, P, R>
where
    C: Connector,
    P: Clone + Send + 'static,
    R: Send,
{
    /// Assembles a context; no task runs and no connection attempt is made
    /// until the caller asks for one.
    pub fn new(config: AppConfig, connector: C) -> Self {
        Self {
            config,
            tasks: TaskManager::new(),
            events: Arc::new(EventDispatcher::new()),
            db: Arc::new(SafeConnection::new(connector)),
        }
    }

    /// Orderly teardown: signals every task, then closes the connection.
    ///
    /// Returns how many tasks were signalled. Cancellation is cooperative, so
    /// callers that need the tasks fully gone should await their own
    /// synchronization after this.
    pub async fn shutdown(&self) -> usize {
        let stopped = self.tasks.stop_all().await;
        self.db.close().await;
        info!(tasks_stopped = stopped, "application context shut down");
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::time::Duration;

    struct NullConnector;

    #[async_trait]
    impl Connector for NullConnector {
        type Handle = ();

        fn name(&self) -> &str {
            "null"
        }

        async fn connect(&self) -> Result<(), ConnectError> {
            Ok(())
        }

        async fn ping(&self, _handle: &()) -> Result<(), ConnectError> {
            Ok(())
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            token: "t".into(),
            database_url: None,
            log_dir: PathBuf::from("logs"),
        }
    }

    #[tokio::test]
    async fn shutdown_stops_tasks_and_closes_connection() {
        use crate::connect::ConnectionState;
        use crate::error::TaskError;
        use crate::tasks::TaskFn;
        use tokio_util::sync::CancellationToken;

        let ctx: AppContext<NullConnector, (), ()> = AppContext::new(config(), NullConnector);
        assert!(ctx.db.init(1, Duration::ZERO).await);

        ctx.tasks
            .start(
                "idle",
                TaskFn::arc(|tok: CancellationToken| async move {
                    tok.cancelled().await;
                    Err(TaskError::Cancelled)
                }),
            )
            .await;

        assert_eq!(ctx.shutdown().await, 1);
        assert_eq!(ctx.db.state(), ConnectionState::Uninitialized);
    }
}
