//! Uniform success/error value for connection operations.

use std::sync::Arc;

/// Outcome of one operation performed through a
/// [`SafeConnection`](super::SafeConnection).
///
/// Produced by every connection operation and by nothing else; it is the
/// alternative to raising. `success` is the single source of truth for
/// boolean interpretation, regardless of what `data` or `error` hold.
#[derive(Clone, Debug)]
pub struct OperationResult<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success.
    pub data: Option<T>,
    /// Failure description on error.
    pub error: Option<String>,
    /// Operation name, for diagnostics.
    pub operation: Arc<str>,
}

impl<T> OperationResult<T> {
    /// A successful result carrying `data`.
    pub fn ok(operation: &str, data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            operation: Arc::from(operation),
        }
    }

    /// A failed result carrying an error description.
    pub fn err(operation: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            operation: Arc::from(operation),
        }
    }

    /// Equivalent to reading `success`.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Moves the payload out, discarding diagnostics.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<T> From<&OperationResult<T>> for bool {
    fn from(res: &OperationResult<T>) -> bool {
        res.success
    }
}

impl<T> From<OperationResult<T>> for bool {
    fn from(res: OperationResult<T>) -> bool {
        res.success
    }
}

impl<T: std::fmt::Debug> std::fmt::Display for OperationResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.success {
            write!(f, "{}: ok ({:?})", self.operation, self.data)
        } else {
            write!(
                f,
                "{}: error ({})",
                self.operation,
                self.error.as_deref().unwrap_or("unknown")
            )
        }
    }
}
