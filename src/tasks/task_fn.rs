//! Closure-backed [`Task`] implementation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Wraps a closure that produces a fresh future per run.
///
/// Because the closure is `Fn`, every run owns its own state; share state
/// across restarts explicitly with an `Arc` captured by the closure.
///
/// # Example
/// ```
/// use botvisor::{TaskError, TaskFn, TaskRef};
/// use tokio_util::sync::CancellationToken;
///
/// let work: TaskRef = TaskFn::arc(|_ctx: CancellationToken| async {
///     Ok::<_, TaskError>(())
/// });
/// ```
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new closure-backed task.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn each_run_gets_a_fresh_future() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let task = TaskFn::arc(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let token = CancellationToken::new();
        task.run(token.clone()).await.unwrap();
        task.run(token).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
