//! # Shutter
//!
//! Two-phase cooperative shutdown coordination.
//!
//! A [`Shutter`] lets independent components agree on when a subsystem stops:
//!
//! - **Terminating**: shutdown has begun, cleanup callbacks are running
//! - **Terminated**: every terminating callback has returned
//!
//! Components can poll the phase ([`Shutter::is_terminating`],
//! [`Shutter::is_terminated`]), block or `.await` on a [`Signal`], register
//! callbacks for either phase, guard initialization against a concurrent
//! shutdown with [`Shutter::locked_init`], and [`bind`](Shutter::bind) two
//! shutters so that either one going down takes the other with it.
//!
//! ## Quick Start
//!
//! ```rust
//! use shutter::{Shutter, ShutterError};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let active = Arc::new(AtomicUsize::new(0));
//! let shutter = Shutter::new();
//!
//! let released = active.clone();
//! shutter.on_terminating(move |_err| {
//!     released.store(0, Ordering::SeqCst);
//! });
//!
//! shutter
//!     .locked_init(|| {
//!         active.fetch_add(1, Ordering::SeqCst);
//!         Ok::<_, ShutterError>(())
//!     })
//!     .unwrap();
//!
//! shutter.shutdown_with_error("maintenance");
//! assert_eq!(active.load(Ordering::SeqCst), 0);
//! assert_eq!(shutter.err().unwrap().to_string(), "maintenance");
//! assert_eq!(
//!     shutter.locked_init(|| Ok::<_, ShutterError>(())),
//!     Err(ShutterError::AlreadyShutDown)
//! );
//! ```

mod callbacks;
mod error;
mod options;
mod shutter;
mod signal;


pub use callbacks::Callback;
pub use error::{ShutdownError, ShutterError};
pub use options::{register_on_terminated, register_on_terminating, with_name, ShutterOption};
pub use shutter::{Phase, Shutter};
pub use signal::Signal;
