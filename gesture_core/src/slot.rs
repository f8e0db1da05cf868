//! Single-value, latest-wins hand-off between threads.
//!
//! A producer [`publish`](LatestSlot::publish)es and never waits; an
//! unconsumed value is simply overwritten.  Consumers copy the value out
//! (cheap when `T` is an `Arc`) and can wait briefly for something newer
//! than what they last saw.  The lock is held only for the copy in or out.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A value tagged with its publication sequence number (1-based).
#[derive(Clone, Debug)]
pub struct Stamped<T> {
    pub seq:   u64,
    pub value: T,
}

struct Inner<T> {
    seq:   u64,
    value: Option<T>,
}

pub struct LatestSlot<T> {
    inner: Mutex<Inner<T>>,
    fresh: Condvar,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        LatestSlot {
            inner: Mutex::new(Inner { seq: 0, value: None }),
            fresh: Condvar::new(),
        }
    }
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking holder cannot leave a half-written value: the slot is
    // only ever assigned whole.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current value.  Returns its sequence number.
    pub fn publish(&self, value: T) -> u64 {
        let seq = {
            let mut inner = self.lock();
            inner.seq += 1;
            inner.value = Some(value);
            inner.seq
        };
        self.fresh.notify_all();
        seq
    }

    /// Copy of the most recent value, if any was ever published.
    pub fn latest(&self) -> Option<Stamped<T>> {
        let inner = self.lock();
        inner.value.as_ref().map(|v| Stamped { seq: inner.seq, value: v.clone() })
    }

    /// Wait up to `timeout` for a value newer than `after`.
    pub fn wait_newer(&self, after: u64, timeout: Duration) -> Option<Stamped<T>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        while inner.seq <= after || inner.value.is_none() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return None;
            }
            inner = self
                .fresh
                .wait_timeout(inner, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        inner.value.as_ref().map(|v| Stamped { seq: inner.seq, value: v.clone() })
    }

    /// Sequence number of the latest publication (0 = never).
    pub fn seq(&self) -> u64 {
        self.lock().seq
    }
}
