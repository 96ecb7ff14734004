//! Sequential event dispatcher with per-handler fault isolation.
//!
//! [`EventDispatcher`] maps event names to ordered handler lists and invokes
//! them one at a time, in registration order. A failing handler is logged and
//! contributes a `None` placeholder at its position; it never aborts the rest
//! of the dispatch and never propagates to the caller.

mod dispatcher;
mod handler;

pub use dispatcher::EventDispatcher;
pub use handler::{Handler, HandlerFn, HandlerRef};
