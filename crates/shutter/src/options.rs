//! Construction-time options for [`Shutter::with_options`](crate::Shutter::with_options).

use crate::callbacks::Callback;
use crate::error::ShutdownError;
use std::fmt;

/// A setting applied to a shutter before it is handed out.
pub enum ShutterOption {
    /// Register a terminating callback.
    OnTerminating(Callback),
    /// Register a terminated callback.
    OnTerminated(Callback),
    /// Label the shutter in log output.
    Name(String),
}

/// Registers `f` to run when the shutter starts terminating.
pub fn register_on_terminating<F>(f: F) -> ShutterOption
where
    F: FnOnce(Option<ShutdownError>) + Send + 'static,
{
    ShutterOption::OnTerminating(Box::new(f))
}

/// Registers `f` to run once the shutter has terminated.
pub fn register_on_terminated<F>(f: F) -> ShutterOption
where
    F: FnOnce(Option<ShutdownError>) + Send + 'static,
{
    ShutterOption::OnTerminated(Box::new(f))
}

/// Names the shutter.
pub fn with_name(name: impl Into<String>) -> ShutterOption {
    ShutterOption::Name(name.into())
}

impl fmt::Debug for ShutterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTerminating(_) => f.write_str("OnTerminating(..)"),
            Self::OnTerminated(_) => f.write_str("OnTerminated(..)"),
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}
