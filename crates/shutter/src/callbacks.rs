//! Ordered callback lists for the two shutdown phases.

use crate::error::ShutdownError;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A handler run once when its phase is reached.
pub type Callback = Box<dyn FnOnce(Option<ShutdownError>) + Send + 'static>;

/// Append-only list of callbacks for one phase.
///
/// Callbacks queue up until [`CallbackList::flush`] runs them. Once flushed,
/// the list refuses new entries and hands them back to the caller, who runs
/// them inline. The lock is never held while a callback runs.
#[derive(Default)]
pub(crate) struct CallbackList {
    state: Mutex<ListState>,
}

#[derive(Default)]
struct ListState {
    pending: Vec<Callback>,
    flushed: bool,
}

impl CallbackList {
    fn state(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `callback`, or returns it if this list has already been flushed.
    pub(crate) fn push(&self, callback: Callback) -> Option<Callback> {
        let mut state = self.state();
        if state.flushed {
            return Some(callback);
        }
        state.pending.push(callback);
        None
    }

    /// Runs every queued callback in registration order, then marks the list
    /// flushed. Returns how many callbacks ran.
    ///
    /// Callbacks queued while the flush is in progress, including by the
    /// callbacks themselves, run in the same flush after the ones before them.
    pub(crate) fn flush(&self, err: &Option<ShutdownError>) -> usize {
        let mut ran = 0;
        loop {
            let batch = {
                let mut state = self.state();
                if state.pending.is_empty() {
                    state.flushed = true;
                    return ran;
                }
                std::mem::take(&mut state.pending)
            };

            for callback in batch {
                callback(err.clone());
                ran += 1;
            }
        }
    }

    /// Queues `callback` on a list that is not shared yet.
    pub(crate) fn queue(&mut self, callback: Callback) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .push(callback);
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.state().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(log: &Arc<Mutex<Vec<u32>>>, id: u32) -> Callback {
        let log = log.clone();
        Box::new(move |_| log.lock().unwrap().push(id))
    }

    #[test]
    fn test_flush_runs_in_registration_order() {
        let list = CallbackList::default();
        let log = Arc::new(Mutex::new(Vec::new()));

        for id in 1..=3 {
            assert!(list.push(recorder(&log, id)).is_none());
        }
        assert_eq!(list.pending(), 3);

        assert_eq!(list.flush(&None), 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(list.pending(), 0);
    }

    #[test]
    fn test_push_after_flush_is_handed_back() {
        let list = CallbackList::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        list.flush(&None);

        let returned = list.push(recorder(&log, 7)).expect("flushed list should refuse");
        assert!(log.lock().unwrap().is_empty());
        returned(None);
        assert_eq!(*log.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_callbacks_queued_during_flush_run_in_same_flush() {
        let list = Arc::new(CallbackList::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_list = list.clone();
        let inner_log = log.clone();
        list.push(Box::new(move |_| {
            inner_log.lock().unwrap().push(1);
            let nested = recorder(&inner_log, 3);
            assert!(inner_list.push(nested).is_none());
        }));
        list.push(recorder(&log, 2));

        assert_eq!(list.flush(&None), 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_flush_passes_error_to_each_callback() {
        let list = CallbackList::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            list.push(Box::new(move |err: Option<ShutdownError>| {
                seen.lock().unwrap().push(err.map(|e| e.to_string()));
            }));
        }

        let err: ShutdownError = Arc::from(Box::<dyn std::error::Error + Send + Sync>::from("boom"));
        list.flush(&Some(err));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("boom".to_string()), Some("boom".to_string())]
        );
    }
}
