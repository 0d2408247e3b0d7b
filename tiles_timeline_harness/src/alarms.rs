// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tiles_timeline_core::backend::{AlarmCallback, AlarmHandle, AlarmScheduler};
use tiles_timeline_core::time::EpochMillis;

/// One registration made through a [`ManualAlarmScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmRecord {
    /// Handle returned to the caller.
    pub handle: AlarmHandle,
    /// Requested deadline.
    pub at: EpochMillis,
    /// The registration was withdrawn before it fired.
    pub cancelled: bool,
    /// The callback has run.
    pub fired: bool,
}

#[derive(Default)]
struct State {
    pending: BTreeMap<(EpochMillis, u64), AlarmCallback>,
    /// Callbacks of cancelled alarms, kept for [`ManualAlarmScheduler::replay_cancelled`].
    cancelled: Vec<(u64, AlarmCallback)>,
    records: Vec<AlarmRecord>,
}

impl State {
    fn record_mut(&mut self, id: u64) -> Option<&mut AlarmRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get_mut(i))
    }
}

/// An [`AlarmScheduler`] that fires only when the test says so.
///
/// Handles are assigned sequentially from zero. Clones share the same
/// registrations.
#[derive(Clone, Default)]
pub struct ManualAlarmScheduler {
    state: Rc<RefCell<State>>,
}

impl fmt::Debug for ManualAlarmScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualAlarmScheduler")
            .field("pending", &state.pending.len())
            .field("cancelled", &state.cancelled.len())
            .field("registrations", &state.records.len())
            .finish_non_exhaustive()
    }
}

impl ManualAlarmScheduler {
    /// Creates a scheduler with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline of the earliest pending alarm.
    #[must_use]
    pub fn next_deadline(&self) -> Option<EpochMillis> {
        self.state.borrow().pending.keys().next().map(|&(at, _)| at)
    }

    /// Pending alarms in deadline order.
    #[must_use]
    pub fn pending(&self) -> Vec<(AlarmHandle, EpochMillis)> {
        self.state
            .borrow()
            .pending
            .keys()
            .map(|&(at, id)| (AlarmHandle(id), at))
            .collect()
    }

    /// Number of pending alarms.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Every registration ever made, in registration order.
    #[must_use]
    pub fn history(&self) -> Vec<AlarmRecord> {
        self.state.borrow().records.clone()
    }

    /// Fires the earliest pending alarm if its deadline is at or before
    /// `now`, and returns its handle.
    pub fn fire_next_due(&self, now: EpochMillis) -> Option<AlarmHandle> {
        let (key, callback) = {
            let mut state = self.state.borrow_mut();
            let key = *state.pending.keys().next()?;
            if key.0 > now {
                return None;
            }
            let callback = state.pending.remove(&key)?;
            if let Some(record) = state.record_mut(key.1) {
                record.fired = true;
            }
            (key, callback)
        };
        callback();
        Some(AlarmHandle(key.1))
    }

    /// Fires every alarm due at `now`, earliest first, including alarms a
    /// firing registers for a deadline that is already due. Returns how many
    /// fired.
    pub fn fire_due(&self, now: EpochMillis) -> usize {
        let mut fired = 0;
        while self.fire_next_due(now).is_some() {
            fired += 1;
        }
        fired
    }

    /// Runs the callbacks of cancelled alarms that never fired, as a
    /// scheduler that does not honor cancellation would. Returns how many
    /// ran.
    pub fn replay_cancelled(&self) -> usize {
        let cancelled = core::mem::take(&mut self.state.borrow_mut().cancelled);
        let count = cancelled.len();
        for (id, callback) in cancelled {
            if let Some(record) = self.state.borrow_mut().record_mut(id) {
                record.fired = true;
            }
            callback();
        }
        count
    }
}

impl AlarmScheduler for ManualAlarmScheduler {
    fn schedule(&self, at: EpochMillis, callback: AlarmCallback) -> AlarmHandle {
        let mut state = self.state.borrow_mut();
        let id = state.records.len() as u64;
        state.records.push(AlarmRecord {
            handle: AlarmHandle(id),
            at,
            cancelled: false,
            fired: false,
        });
        state.pending.insert((at, id), callback);
        AlarmHandle(id)
    }

    fn cancel(&self, handle: AlarmHandle) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.record_mut(handle.0) else {
            return;
        };
        if record.cancelled || record.fired {
            return;
        }
        record.cancelled = true;
        let key = (record.at, handle.0);
        if let Some(callback) = state.pending.remove(&key) {
            state.cancelled.push((handle.0, callback));
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use super::*;

    fn bump(count: &Rc<Cell<u32>>) -> AlarmCallback {
        let count = Rc::clone(count);
        Box::new(move || count.set(count.get() + 1))
    }

    #[test]
    fn fires_only_when_due() {
        let alarms = ManualAlarmScheduler::new();
        let count = Rc::new(Cell::new(0));
        let handle = alarms.schedule(EpochMillis(100), bump(&count));

        assert_eq!(alarms.fire_next_due(EpochMillis(99)), None);
        assert_eq!(alarms.fire_next_due(EpochMillis(100)), Some(handle));
        assert_eq!(count.get(), 1);
        assert_eq!(alarms.pending_len(), 0);
        assert!(alarms.history()[0].fired);
    }

    #[test]
    fn cancelled_alarms_can_be_replayed() {
        let alarms = ManualAlarmScheduler::new();
        let count = Rc::new(Cell::new(0));
        let handle = alarms.schedule(EpochMillis(100), bump(&count));
        alarms.cancel(handle);
        alarms.cancel(handle);

        assert_eq!(alarms.fire_due(EpochMillis(1_000)), 0);
        assert_eq!(count.get(), 0);
        assert_eq!(alarms.replay_cancelled(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(alarms.replay_cancelled(), 0);

        let record = alarms.history()[0];
        assert!(record.cancelled && record.fired);
    }

    #[test]
    fn cancelling_a_fired_alarm_is_a_noop() {
        let alarms = ManualAlarmScheduler::new();
        let count = Rc::new(Cell::new(0));
        let handle = alarms.schedule(EpochMillis(0), bump(&count));
        alarms.fire_due(EpochMillis(0));
        alarms.cancel(handle);
        assert!(!alarms.history()[0].cancelled);
        assert_eq!(alarms.replay_cancelled(), 0);
    }

    #[test]
    fn pending_is_deadline_ordered() {
        let alarms = ManualAlarmScheduler::new();
        let count = Rc::new(Cell::new(0));
        alarms.schedule(EpochMillis(30), bump(&count));
        alarms.schedule(EpochMillis(10), bump(&count));
        assert_eq!(
            alarms.pending(),
            [
                (AlarmHandle(1), EpochMillis(10)),
                (AlarmHandle(0), EpochMillis(30)),
            ]
        );
        assert_eq!(alarms.next_deadline(), Some(EpochMillis(10)));
    }
}
