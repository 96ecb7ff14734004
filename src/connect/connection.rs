//! Single-flight, retrying connection wrapper.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{error, info, warn};

use crate::connect::connector::Connector;
use crate::connect::result::OperationResult;
use crate::error::ConnectError;

/// Initialization state of a [`SafeConnection`].
///
/// Transitions move forward only, except `Failed → Connecting` when a caller
/// explicitly retries `init` after an exhausted attempt sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No attempt has been made yet.
    Uninitialized,
    /// An attempt sequence is in flight.
    Connecting,
    /// The handle is established and validated.
    Ready,
    /// The last attempt sequence exhausted its retries.
    Failed,
}

/// Lazily initialized handle to one external resource.
///
/// `init` is single-flight: concurrent callers collapse into one real attempt
/// sequence and all of them observe its outcome. Every operation performed
/// through [`run`](SafeConnection::run) returns an [`OperationResult`];
/// driver errors never cross this boundary raw.
pub struct SafeConnection<C: Connector> {
    connector: C,
    state: Mutex<ConnectionState>,
    handle: RwLock<Option<Arc<C::Handle>>>,
    /// Serializes attempt sequences; waiters queue here during a flight.
    init_lock: AsyncMutex<()>,
    /// Bumped when a flight concludes, so queued waiters can tell they
    /// arrived mid-flight and must adopt that flight's outcome.
    flight_epoch: AtomicU64,
}

impl<C: Connector> SafeConnection<C> {
    /// Wraps a connector; no connection attempt is made until `init`.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: Mutex::new(ConnectionState::Uninitialized),
            handle: RwLock::new(None),
            init_lock: AsyncMutex::new(()),
            flight_epoch: AtomicU64::new(0),
        }
    }

    /// Current initialization state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("connection state lock poisoned")
    }

    /// Establishes the connection, retrying up to `max_retries` times with
    /// `retry_delay` between attempts. `max_retries` is clamped to at least
    /// one attempt.
    ///
    /// Returns `true` once `Ready`; if a previous call already succeeded this
    /// is immediate, with no new attempt. Callers that arrive while an attempt
    /// sequence is in flight wait for its outcome instead of starting their
    /// own. A fresh call after a `Failed` sequence retries (`Failed →
    /// Connecting`).
    pub async fn init(&self, max_retries: u32, retry_delay: Duration) -> bool {
        if self.state() == ConnectionState::Ready {
            return true;
        }

        let epoch_at_entry = self.flight_epoch.load(Ordering::Acquire);
        let _flight = self.init_lock.lock().await;

        if self.state() == ConnectionState::Ready {
            return true;
        }
        if self.flight_epoch.load(Ordering::Acquire) != epoch_at_entry {
            // A flight concluded while this caller was queued; adopt its
            // outcome rather than starting a second attempt sequence.
            return self.state() == ConnectionState::Ready;
        }

        self.set_state(ConnectionState::Connecting);
        let resource = self.connector.name().to_string();
        let max_retries = max_retries.max(1);

        for attempt in 1..=max_retries {
            match self.try_connect().await {
                Ok(handle) => {
                    *self.handle.write().await = Some(Arc::new(handle));
                    self.set_state(ConnectionState::Ready);
                    self.flight_epoch.fetch_add(1, Ordering::AcqRel);
                    info!(resource = %resource, attempt, "connection established");
                    return true;
                }
                Err(err) => {
                    error!(
                        resource = %resource,
                        attempt,
                        max_retries,
                        error = %err,
                        "connection attempt failed"
                    );
                    if attempt < max_retries {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Failed);
        self.flight_epoch.fetch_add(1, Ordering::AcqRel);
        error!(
            resource = %resource,
            max_retries,
            "connection failed after exhausting retries"
        );
        false
    }

    /// Runs one operation against the established handle.
    ///
    /// Any failure, including "connection not ready", is captured into the
    /// returned [`OperationResult`]; nothing is raised past this boundary.
    pub async fn run<T, F, Fut>(&self, operation: &str, f: F) -> OperationResult<T>
    where
        F: FnOnce(Arc<C::Handle>) -> Fut,
        Fut: Future<Output = Result<T, ConnectError>>,
    {
        if self.state() != ConnectionState::Ready {
            warn!(operation, "operation refused: connection not ready");
            return OperationResult::err(operation, ConnectError::NotReady.to_string());
        }

        let handle = { self.handle.read().await.clone() };
        let Some(handle) = handle else {
            warn!(operation, "operation refused: connection not ready");
            return OperationResult::err(operation, ConnectError::NotReady.to_string());
        };

        match f(handle).await {
            Ok(data) => OperationResult::ok(operation, data),
            Err(err) => {
                error!(operation, error = %err, "operation failed");
                OperationResult::err(operation, err.to_string())
            }
        }
    }

    /// Drops the handle and returns the state to `Uninitialized`.
    ///
    /// A later `init` starts a fresh attempt sequence.
    pub async fn close(&self) {
        *self.handle.write().await = None;
        self.set_state(ConnectionState::Uninitialized);
        info!(resource = self.connector.name(), "connection closed");
    }

    async fn try_connect(&self) -> Result<C::Handle, ConnectError> {
        let handle = self.connector.connect().await?;
        self.connector.ping(&handle).await?;
        Ok(handle)
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().expect("connection state lock poisoned") = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Connector that fails the first `fail_first` connect calls.
    struct FakeConnector {
        fail_first: usize,
        connect_delay: Duration,
        attempts: Arc<AtomicUsize>,
    }

    impl FakeConnector {
        fn new(fail_first: usize) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    fail_first,
                    connect_delay: Duration::ZERO,
                    attempts: attempts.clone(),
                },
                attempts,
            )
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        type Handle = u64;

        fn name(&self) -> &str {
            "fake"
        }

        async fn connect(&self) -> Result<u64, ConnectError> {
            if !self.connect_delay.is_zero() {
                tokio::time::sleep(self.connect_delay).await;
            }
            let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err(ConnectError::Connect {
                    error: format!("refused (attempt {n})"),
                });
            }
            Ok(n as u64)
        }

        async fn ping(&self, _handle: &u64) -> Result<(), ConnectError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn third_attempt_succeeds_and_later_init_is_free() {
        let (connector, attempts) = FakeConnector::new(2);
        let conn = SafeConnection::new(connector);

        assert!(conn.init(3, Duration::from_millis(1)).await);
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        // Already Ready: no new attempt.
        assert!(conn.init(3, Duration::from_millis(1)).await);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_reports_false_and_failed_state() {
        let (connector, attempts) = FakeConnector::new(usize::MAX);
        let conn = SafeConnection::new(connector);

        assert!(!conn.init(2, Duration::from_millis(1)).await);
        assert_eq!(conn.state(), ConnectionState::Failed);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // Explicit retry starts a fresh attempt sequence.
        assert!(!conn.init(1, Duration::from_millis(1)).await);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_still_makes_one_attempt() {
        let (connector, attempts) = FakeConnector::new(0);
        let conn = SafeConnection::new(connector);

        assert!(conn.init(0, Duration::ZERO).await);
        assert_eq!(conn.state(), ConnectionState::Ready);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_init_is_single_flight() {
        let (mut connector, attempts) = FakeConnector::new(0);
        connector.connect_delay = Duration::from_millis(50);
        let conn = Arc::new(SafeConnection::new(connector));

        let a = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.init(3, Duration::from_millis(1)).await })
        };
        let b = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.init(3, Duration::from_millis(1)).await })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert!(ra && rb);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_waiters_adopt_a_failed_flight() {
        let (mut connector, attempts) = FakeConnector::new(usize::MAX);
        connector.connect_delay = Duration::from_millis(30);
        let conn = Arc::new(SafeConnection::new(connector));

        let a = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.init(2, Duration::from_millis(1)).await })
        };
        let b = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.init(2, Duration::from_millis(1)).await })
        };

        assert!(!a.await.unwrap());
        assert!(!b.await.unwrap());
        // One flight of two attempts, not two flights.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn operations_before_init_fail_without_raising() {
        let (connector, _) = FakeConnector::new(0);
        let conn = SafeConnection::new(connector);

        let res = conn
            .run("find_one", |_h| async move { Ok::<_, ConnectError>(1u32) })
            .await;
        assert!(!res.is_success());
        assert!(res.error.as_deref().unwrap().contains("not ready"));
        assert_eq!(&*res.operation, "find_one");
    }

    #[tokio::test]
    async fn operations_map_outcomes_into_results() {
        let (connector, _) = FakeConnector::new(0);
        let conn = SafeConnection::new(connector);
        assert!(conn.init(1, Duration::ZERO).await);

        let ok = conn
            .run("count", |h| async move { Ok::<_, ConnectError>(*h) })
            .await;
        assert!(ok.is_success());
        assert_eq!(ok.data, Some(1));

        let failed = conn
            .run("count", |_h| async move {
                Err::<u64, _>(ConnectError::operation("cursor died"))
            })
            .await;
        assert!(!failed.is_success());
        assert!(failed.error.as_deref().unwrap().contains("cursor died"));
    }

    #[tokio::test]
    async fn close_resets_to_uninitialized() {
        let (connector, attempts) = FakeConnector::new(0);
        let conn = SafeConnection::new(connector);
        assert!(conn.init(1, Duration::ZERO).await);

        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Uninitialized);

        let res = conn
            .run("ping", |_h| async move { Ok::<_, ConnectError>(()) })
            .await;
        assert!(!res.is_success());

        assert!(conn.init(1, Duration::ZERO).await);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
