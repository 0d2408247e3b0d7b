// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event-loop alarm queue.
//!
//! [`AlarmQueue`] implements [`AlarmScheduler`] for hosts that own their
//! event loop. The host asks [`next_deadline`](AlarmQueue::next_deadline) how
//! long it may sleep, and calls [`run_due`](AlarmQueue::run_due) after
//! waking:
//!
//! ```rust,ignore
//! loop {
//!     let wait = alarms.time_until_next(now());
//!     poll_host_events(wait);
//!     alarms.run_due(now());
//! }
//! ```
//!
//! The queue is a cheap handle: clones share the same registrations, so one
//! clone can be given to a manager while the host keeps another.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use tiles_timeline_core::backend::{AlarmCallback, AlarmHandle, AlarmScheduler};
use tiles_timeline_core::time::EpochMillis;

#[derive(Default)]
struct Registrations {
    next_id: u64,
    /// Pending callbacks ordered by deadline, then registration order.
    by_deadline: BTreeMap<(EpochMillis, u64), AlarmCallback>,
    deadlines: HashMap<u64, EpochMillis>,
}

/// Deadline-ordered one-shot alarms, fired by the host event loop.
#[derive(Clone, Default)]
pub struct AlarmQueue {
    inner: Rc<RefCell<Registrations>>,
}

impl std::fmt::Debug for AlarmQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AlarmQueue")
            .field("pending", &inner.by_deadline.len())
            .field("next_deadline", &inner.by_deadline.keys().next().map(|k| k.0))
            .finish_non_exhaustive()
    }
}

impl AlarmQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending alarms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().by_deadline.len()
    }

    /// Returns `true` if no alarm is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().by_deadline.is_empty()
    }

    /// Deadline of the earliest pending alarm.
    #[must_use]
    pub fn next_deadline(&self) -> Option<EpochMillis> {
        self.inner.borrow().by_deadline.keys().next().map(|&(at, _)| at)
    }

    /// How long the host may sleep before the earliest alarm is due, or
    /// `None` if nothing is pending. Zero if an alarm is already due.
    #[must_use]
    pub fn time_until_next(&self, now: EpochMillis) -> Option<Duration> {
        self.next_deadline().map(|at| {
            let millis = u64::try_from(at.saturating_since(now).millis()).unwrap_or(0);
            Duration::from_millis(millis)
        })
    }

    /// Fires every alarm whose deadline is at or before `now`, earliest
    /// first, and returns how many fired.
    ///
    /// Alarms registered by a callback during this pass wait for the next
    /// call, even if already due. Alarms cancelled by an earlier callback in
    /// the same pass do not fire.
    pub fn run_due(&self, now: EpochMillis) -> usize {
        let due: Vec<(EpochMillis, u64)> = self
            .inner
            .borrow()
            .by_deadline
            .range(..=(now, u64::MAX))
            .map(|(key, _)| *key)
            .collect();

        let mut fired = 0;
        for key in due {
            let callback = {
                let mut inner = self.inner.borrow_mut();
                inner.deadlines.remove(&key.1);
                inner.by_deadline.remove(&key)
            };
            if let Some(callback) = callback {
                callback();
                fired += 1;
            }
        }
        fired
    }
}

impl AlarmScheduler for AlarmQueue {
    fn schedule(&self, at: EpochMillis, callback: AlarmCallback) -> AlarmHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.by_deadline.insert((at, id), callback);
        inner.deadlines.insert(id, at);
        AlarmHandle(id)
    }

    fn cancel(&self, handle: AlarmHandle) {
        let mut inner = self.inner.borrow_mut();
        if let Some(at) = inner.deadlines.remove(&handle.0) {
            inner.by_deadline.remove(&(at, handle.0));
        }
    }
}
