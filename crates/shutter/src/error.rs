//! Error types for the shutter.

use std::sync::Arc;

/// The cause handed to [`Shutter::shutdown`](crate::Shutter::shutdown).
///
/// Stored once and shared with every callback and every call to
/// [`Shutter::err`](crate::Shutter::err), hence the `Arc`.
pub type ShutdownError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the shutter itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShutterError {
    /// `locked_init` was called after shutdown had already begun.
    #[error("locked_init was called on an already shut down shutter")]
    AlreadyShutDown,
}
