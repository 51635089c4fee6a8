//! The shutter: a two-phase shutdown coordinator.
//!
//! A [`Shutter`] moves through three phases, strictly forward:
//!
//! ```text
//! Running ──shutdown()──▶ Terminating ──callbacks done──▶ Terminated
//! ```
//!
//! Only the first call to [`Shutter::shutdown`] has any effect. That caller
//! records the cause, fires the terminating signal, runs the terminating
//! callbacks, fires the terminated signal, then runs the terminated callbacks,
//! all on its own thread.

use crate::callbacks::{Callback, CallbackList};
use crate::error::{ShutdownError, ShutterError};
use crate::options::ShutterOption;
use crate::signal::Signal;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, trace};

/// Lifecycle phase of a [`Shutter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Shutdown has not been triggered.
    Running,
    /// Shutdown was triggered and terminating callbacks are running.
    Terminating,
    /// All terminating callbacks have completed.
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Running => f.write_str("running"),
            Phase::Terminating => f.write_str("terminating"),
            Phase::Terminated => f.write_str("terminated"),
        }
    }
}

/// Cooperative shutdown coordinator.
///
/// Cloning a `Shutter` yields another handle to the same lifecycle.
///
/// # Example
///
/// ```rust
/// use shutter::{register_on_terminating, Shutter};
///
/// let shutter = Shutter::with_options([register_on_terminating(|err| {
///     assert!(err.is_none());
/// })]);
///
/// shutter.shutdown(None);
/// assert!(shutter.is_terminated());
/// ```
#[derive(Clone, Default)]
pub struct Shutter {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    name: Option<String>,
    // One-time gate; whoever flips it runs the shutdown sequence.
    triggered: AtomicBool,
    // Entry guard. Serializes state mutation in `shutdown` with `locked_init`.
    entry: Mutex<()>,
    // Set before `terminating` fires, never changed after.
    err: OnceLock<Option<ShutdownError>>,
    terminating: Signal,
    terminated: Signal,
    on_terminating: CallbackList,
    on_terminated: CallbackList,
}

impl Shutter {
    /// Creates a running shutter with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a running shutter and applies `options` in order.
    pub fn with_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ShutterOption>,
    {
        let mut inner = Inner::default();
        for option in options {
            match option {
                ShutterOption::OnTerminating(callback) => inner.on_terminating.queue(callback),
                ShutterOption::OnTerminated(callback) => inner.on_terminated.queue(callback),
                ShutterOption::Name(name) => inner.name = Some(name),
            }
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The name given with [`with_name`](crate::with_name), if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name().unwrap_or("shutter")
    }

    fn entry(&self) -> MutexGuard<'_, ()> {
        self.inner.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shuts the shutter down with `err` as the cause (`None` for a clean
    /// shutdown).
    ///
    /// Only the first call has an effect; later or concurrent calls return
    /// immediately without waiting for the first one to finish. The first
    /// caller runs every terminating callback, then every terminated callback,
    /// synchronously, so this blocks for as long as they take. A callback that
    /// never returns stalls shutdown forever.
    ///
    /// # Deadlock
    ///
    /// Never call this from inside a [`Shutter::locked_init`] closure on the
    /// same shutter.
    pub fn shutdown(&self, err: Option<ShutdownError>) {
        if self.inner.triggered.swap(true, Ordering::AcqRel) {
            trace!(shutter = self.label(), "shutdown already triggered");
            return;
        }

        let cause = err.as_ref().map(|e| e.to_string());
        debug!(shutter = self.label(), ?cause, "shutter terminating");

        {
            let _entry = self.entry();
            // The gate guarantees this is the only writer.
            let _ = self.inner.err.set(err.clone());
            self.inner.terminating.fire();
        }

        let ran = self.inner.on_terminating.flush(&err);
        trace!(shutter = self.label(), callbacks = ran, "terminating callbacks done");

        {
            let _entry = self.entry();
            self.inner.terminated.fire();
        }
        debug!(shutter = self.label(), ?cause, "shutter terminated");

        let ran = self.inner.on_terminated.flush(&err);
        trace!(shutter = self.label(), callbacks = ran, "terminated callbacks done");
    }

    /// Shuts down with `err` as the cause. See [`Shutter::shutdown`].
    pub fn shutdown_with_error<E>(&self, err: E)
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let err: Box<dyn std::error::Error + Send + Sync> = err.into();
        self.shutdown(Some(Arc::from(err)))
    }

    /// Runs `f` only if shutdown has not begun, and keeps shutdown from
    /// beginning until `f` returns.
    ///
    /// Returns [`ShutterError::AlreadyShutDown`] without calling `f` if the
    /// shutter is already terminating. Otherwise returns whatever `f` returns.
    ///
    /// The usual pairing is to acquire something here and release it in an
    /// [`on_terminating`](Shutter::on_terminating) callback: the release then
    /// sees every acquire that succeeded and no acquire can slip in after it.
    ///
    /// # Deadlock
    ///
    /// `f` runs with the entry guard held and the guard is not reentrant.
    /// Calling [`Shutter::shutdown`] on the same shutter from inside `f`
    /// deadlocks. Keep `f` short; a concurrent shutdown waits on it.
    pub fn locked_init<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<ShutterError>,
    {
        let _entry = self.entry();
        if self.is_terminating() {
            return Err(ShutterError::AlreadyShutDown.into());
        }
        f()
    }

    /// Registers `f` to run when the shutter starts terminating.
    ///
    /// If that phase's callbacks have already run, `f` runs right away on
    /// this thread with the recorded cause.
    pub fn on_terminating<F>(&self, f: F)
    where
        F: FnOnce(Option<ShutdownError>) + Send + 'static,
    {
        if let Some(callback) = self.inner.on_terminating.push(Box::new(f)) {
            self.run_late(callback, Phase::Terminating);
        }
    }

    /// Registers `f` to run once the shutter has terminated.
    ///
    /// If the shutter has already terminated, `f` runs right away on this
    /// thread with the recorded cause.
    pub fn on_terminated<F>(&self, f: F)
    where
        F: FnOnce(Option<ShutdownError>) + Send + 'static,
    {
        if let Some(callback) = self.inner.on_terminated.push(Box::new(f)) {
            self.run_late(callback, Phase::Terminated);
        }
    }

    fn run_late(&self, callback: Callback, phase: Phase) {
        trace!(shutter = self.label(), %phase, "phase already passed, running callback inline");
        callback(self.err());
    }

    /// Ties this shutter's lifecycle to `other`'s.
    ///
    /// Whichever of the two shuts down first shuts the other down with the
    /// same cause. Binding cannot be undone. Each side keeps the other alive
    /// until its terminating callbacks have run, so a peer whose handles were
    /// all dropped is still shut down and still runs its callbacks.
    ///
    /// If either side is already shut down, the other is shut down before
    /// this returns. Don't bind from inside [`Shutter::locked_init`].
    pub fn bind(&self, other: &Shutter) {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        debug!(shutter = self.label(), peer = other.label(), "binding shutters");
        self.propagate_to(other);
        other.propagate_to(self);
    }

    fn propagate_to(&self, target: &Shutter) {
        let target = target.clone();
        self.on_terminating(move |err| target.shutdown(err));
    }

    /// Returns true once shutdown has begun.
    pub fn is_terminating(&self) -> bool {
        self.inner.terminating.is_fired()
    }

    /// Returns true once every terminating callback has completed.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.is_fired()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        if self.is_terminated() {
            Phase::Terminated
        } else if self.is_terminating() {
            Phase::Terminating
        } else {
            Phase::Running
        }
    }

    /// Signal that fires when shutdown begins.
    pub fn terminating(&self) -> Signal {
        self.inner.terminating.clone()
    }

    /// Signal that fires when every terminating callback has completed.
    pub fn terminated(&self) -> Signal {
        self.inner.terminated.clone()
    }

    /// The cause given to [`Shutter::shutdown`], or `None` if the shutdown was
    /// clean or has not happened yet.
    pub fn err(&self) -> Option<ShutdownError> {
        self.inner.err.get().cloned().flatten()
    }
}

impl fmt::Debug for Shutter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutter")
            .field("name", &self.inner.name)
            .field("phase", &self.phase())
            .field("err", &self.err())
            .finish()
    }
}
