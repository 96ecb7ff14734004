//! Safe external-resource connection wrapper.
//!
//! [`SafeConnection`] lazily establishes a resource handle through a
//! [`Connector`] with bounded retry and a single-flight guarantee, then wraps
//! every operation outcome in an [`OperationResult`] instead of raising.
//!
//! The `Connector` trait is the stable adapter seam over the external driver:
//! feature code depends on this module only, and driver/version differences
//! live inside a `Connector` implementation chosen at build or config time.

mod connection;
mod connector;
mod result;

pub use connection::{ConnectionState, SafeConnection};
pub use connector::Connector;
pub use result::OperationResult;
