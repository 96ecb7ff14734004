//! Event handler trait and closure adapter.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// Shared handle to a registered handler.
///
/// Registration identity is `Arc` identity: unregistering removes the first
/// entry that is the *same allocation*, not one that merely looks equal.
pub type HandlerRef<P, R> = Arc<dyn Handler<P, R>>;

/// An async event handler.
///
/// `P` is the event payload the dispatcher clones per handler; `R` is the
/// value appended to the dispatch results at this handler's position.
#[async_trait]
pub trait Handler<P, R>: Send + Sync
where
    P: Send + 'static,
    R: Send,
{
    /// Stable handler name, used when logging a failure.
    fn name(&self) -> &str;

    /// Handles one occurrence of the event.
    async fn handle(&self, event: &str, payload: P) -> Result<R, TaskError>;
}

/// Closure-backed [`Handler`].
///
/// # Example
/// ```
/// use botvisor::{HandlerFn, HandlerRef, TaskError};
///
/// let h: HandlerRef<u32, String> = HandlerFn::arc("doubler", |n: u32| async move {
///     Ok::<_, TaskError>(format!("{}", n * 2))
/// });
/// assert_eq!(h.name(), "doubler");
/// ```
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new closure-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc<P, R, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        P: Send + 'static,
        R: Send,
    {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, P, R, Fut> Handler<P, R> for HandlerFn<F>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
    P: Send + 'static,
    R: Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _event: &str, payload: P) -> Result<R, TaskError> {
        (self.f)(payload).await
    }
}
