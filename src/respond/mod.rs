//! Response-target adapter for the chat-platform boundary.
//!
//! A handler may be invoked for a command (with a request context) or for a
//! platform event; the two carry different send methods. Instead of probing
//! attributes at runtime throughout feature code, the boundary resolves the
//! platform object **once** into a [`RespondTarget`]: a tagged variant with a
//! single `respond` capability behind it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// The single capability feature code needs from either target shape.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Sends one message back through the platform.
    async fn respond(&self, message: &str) -> Result<(), TaskError>;
}

/// Which platform shape a [`RespondTarget`] was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    /// A command invocation's request context.
    Context,
    /// A raw platform event.
    Event,
}

/// A platform object resolved, at the boundary, into a uniform respond
/// capability.
#[derive(Clone)]
pub struct RespondTarget {
    kind: TargetKind,
    sender: Arc<dyn Responder>,
}

impl RespondTarget {
    /// Adapter for the request-context shape.
    pub fn for_context(sender: Arc<dyn Responder>) -> Self {
        Self {
            kind: TargetKind::Context,
            sender,
        }
    }

    /// Adapter for the platform-event shape.
    pub fn for_event(sender: Arc<dyn Responder>) -> Self {
        Self {
            kind: TargetKind::Event,
            sender,
        }
    }

    /// The shape this target was resolved from.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Sends one message through whichever shape backs this target.
    pub async fn respond(&self, message: &str) -> Result<(), TaskError> {
        self.sender.respond(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Responder for Recorder {
        async fn respond(&self, message: &str) -> Result<(), TaskError> {
            self.0.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn both_shapes_expose_one_respond_capability() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));

        let ctx = RespondTarget::for_context(rec.clone());
        let ev = RespondTarget::for_event(rec.clone());
        assert_eq!(ctx.kind(), TargetKind::Context);
        assert_eq!(ev.kind(), TargetKind::Event);

        ctx.respond("hello").await.unwrap();
        ev.respond("world").await.unwrap();
        assert_eq!(*rec.0.lock().unwrap(), vec!["hello", "world"]);
    }
}
