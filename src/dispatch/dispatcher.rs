//! Registry and sequential broadcaster of named events.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::dispatch::handler::HandlerRef;

/// Maps event names to ordered handler lists and dispatches sequentially.
///
/// Insertion order is dispatch order. Registration does not deduplicate: a
/// handler registered twice runs twice, by caller's choice.
///
/// `dispatch` guarantees that the results vector has exactly one slot per
/// handler registered at call time, in registration order; a handler failure
/// leaves `None` at its slot and the remaining handlers still run.
pub struct EventDispatcher<P, R> {
    handlers: RwLock<HashMap<String, Vec<HandlerRef<P, R>>>>,
}

impl<P, R> EventDispatcher<P, R>
where
    P: Clone + Send + 'static,
    R: Send,
{
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `handler` to the ordered list for `event`, creating the list
    /// if absent.
    pub async fn register(&self, event: &str, handler: HandlerRef<P, R>) {
        let mut handlers = self.handlers.write().await;
        handlers
            .entry(event.to_string())
            .or_default()
            .push(handler);
        debug!(event, "handler registered");
    }

    /// Removes the first entry for `event` that is the same handler
    /// allocation as `handler`; reports whether a removal occurred.
    ///
    /// The list stays in place even when emptied; registrations are never
    /// removed automatically.
    pub async fn unregister(&self, event: &str, handler: &HandlerRef<P, R>) -> bool {
        let mut handlers = self.handlers.write().await;
        if let Some(list) = handlers.get_mut(event) {
            if let Some(pos) = list.iter().position(|h| same_handler(h, handler)) {
                list.remove(pos);
                debug!(event, "handler unregistered");
                return true;
            }
        }
        false
    }

    /// Dispatches `event` to every registered handler, in registration
    /// order, one at a time.
    ///
    /// An event with no handlers returns an empty vector immediately; that is
    /// not an error and writes no error log entry. A handler failure is
    /// logged with the event name and handler identity and recorded as `None`
    /// at the handler's position.
    pub async fn dispatch(&self, event: &str, payload: P) -> Vec<Option<R>> {
        // Snapshot under the read lock so handlers may (un)register mid-dispatch
        // without affecting this call's handler list.
        let snapshot: Vec<HandlerRef<P, R>> = {
            let handlers = self.handlers.read().await;
            match handlers.get(event) {
                Some(list) => list.clone(),
                None => {
                    debug!(event, "no handlers registered");
                    return Vec::new();
                }
            }
        };

        let mut results = Vec::with_capacity(snapshot.len());
        for handler in &snapshot {
            match handler.handle(event, payload.clone()).await {
                Ok(value) => results.push(Some(value)),
                Err(err) => {
                    error!(
                        event,
                        handler = handler.name(),
                        error = %err,
                        "event handler failed"
                    );
                    results.push(None);
                }
            }
        }
        results
    }

    /// Number of handlers registered for `event`.
    pub async fn handler_count(&self, event: &str) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(event).map_or(0, Vec::len)
    }

    /// Total number of handlers across all events.
    pub async fn total_handlers(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers.values().map(Vec::len).sum()
    }

    /// Drops every handler for `event`; returns how many were removed.
    pub async fn clear(&self, event: &str) -> usize {
        let mut handlers = self.handlers.write().await;
        handlers.remove(event).map_or(0, |list| list.len())
    }

    /// Drops every handler for every event; returns how many were removed.
    pub async fn clear_all(&self) -> usize {
        let mut handlers = self.handlers.write().await;
        let total = handlers.values().map(Vec::len).sum();
        handlers.clear();
        total
    }
}

impl<P, R> Default for EventDispatcher<P, R>
where
    P: Clone + Send + 'static,
    R: Send,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Allocation identity for trait-object handlers (data pointer only, so the
/// comparison is not confused by vtable duplication across codegen units).
fn same_handler<P, R>(a: &HandlerRef<P, R>, b: &HandlerRef<P, R>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
