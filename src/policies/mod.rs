//! Retry delay policies.
//!
//! [`BackoffPolicy`] computes the delay before restart attempt `n`;
//! [`JitterPolicy`] randomizes that delay to avoid synchronized retries.
//! Both are used by the critical-task supervising loop in
//! [`TaskManager`](crate::TaskManager) and are available to callers of
//! [`SafeConnection::init`](crate::SafeConnection::init) that want growing
//! delays instead of the fixed `retry_delay`.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
