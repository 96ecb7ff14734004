//! Adapter trait over the external resource driver.

use async_trait::async_trait;

use crate::error::ConnectError;

/// Establishes and validates handles to one external resource.
///
/// Implementations adapt a concrete driver (a database client, a platform
/// session) behind a stable interface; [`SafeConnection`](super::SafeConnection)
/// owns the retry and single-flight logic on top. Swapping driver versions
/// means swapping the `Connector`, never patching the driver's own objects.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The established resource handle.
    type Handle: Send + Sync + 'static;

    /// Diagnostic name of the resource (appears in logs).
    fn name(&self) -> &str;

    /// Establishes a new handle.
    async fn connect(&self) -> Result<Self::Handle, ConnectError>;

    /// Liveness check on a fresh handle; a handle that cannot answer is
    /// treated as a failed attempt.
    async fn ping(&self, handle: &Self::Handle) -> Result<(), ConnectError>;
}
