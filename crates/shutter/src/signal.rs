//! One-shot broadcast signal.
//!
//! A [`Signal`] starts open and fires at most once. Firing is level-triggered:
//! every waiter, past or future, observes it, and observing it consumes
//! nothing. Threads block on a condition variable, async tasks on a
//! [`tokio::sync::Notify`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Cloneable handle to a one-shot broadcast signal.
#[derive(Debug, Clone, Default)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

#[derive(Debug, Default)]
struct SignalInner {
    fired: AtomicBool,
    // Pairs with `condvar`; holds no data, `fired` is the state.
    lock: Mutex<()>,
    condvar: Condvar,
    notify: Notify,
}

impl Signal {
    /// Creates a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Fires the signal, waking every waiter.
    ///
    /// Returns `false` if the signal had already fired, in which case nothing
    /// happens.
    pub(crate) fn fire(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        // Taking the lock orders the store above against a blocked waiter's
        // check, so a waiter can't miss the notification.
        drop(self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner));
        self.inner.condvar.notify_all();
        self.inner.notify.notify_waiters();
        true
    }

    /// Blocks the current thread until the signal fires.
    ///
    /// Returns immediately if it already has. Do not call this from inside an
    /// async runtime worker; use [`Signal::fired`] there.
    pub fn wait(&self) {
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .inner
            .condvar
            .wait_while(guard, |_| !self.is_fired())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks the current thread until the signal fires or `timeout` elapses.
    ///
    /// Returns true if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _result) = self
            .inner
            .condvar
            .wait_timeout_while(guard, timeout, |_| !self.is_fired())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_fired()
    }

    /// Completes once the signal has fired.
    pub async fn fired(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);

        // Register interest before checking the flag so a concurrent `fire`
        // between the check and the await still wakes us.
        notified.as_mut().enable();
        if self.is_fired() {
            return;
        }
        notified.await;
    }
}
