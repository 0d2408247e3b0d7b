// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for timeline managers.
//!
//! [`TimelineManager`](crate::manager::TimelineManager) never reads a system
//! clock, arms a timer or spawns work on its own. The host supplies four
//! collaborators:
//!
//! - **[`Clock`]**: the current wall-clock time in epoch milliseconds.
//!   Tests pass a fake clock to make selection deterministic.
//!
//! - **[`AlarmScheduler`]**: one-shot wake-ups keyed by absolute time.
//!   Registration hands back an opaque [`AlarmHandle`] used for
//!   cancellation, so the manager never compares callbacks by identity.
//!
//! - **[`Executor`]**: runs listener notifications, decoupling delivery from
//!   the thread that does the scheduling. It may run the task inline or
//!   later.
//!
//! - **[`Listener`]**: receives each selected entry along with the token the
//!   manager was created with.
//!
//! All methods take `&self`. The manager is confined to one thread and calls
//! back into these objects re-entrantly (an alarm may fire inline, a
//! listener may close the manager), so implementations that keep state use
//! `Cell`/`RefCell` and must not hold a borrow across a callback.
//!
//! # Crate boundaries
//!
//! `tiles_timeline_core` owns selection, scheduling and this contract.
//! `tiles_timeline_backend_std` implements it for a `std` host event loop;
//! `tiles_timeline_harness` implements it with simulated time.

use alloc::boxed::Box;
use core::fmt;

use crate::time::EpochMillis;
use crate::timeline::TimelineEntry;

/// Work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + 'static>;

/// Callback run when an alarm fires.
pub type AlarmCallback = Box<dyn FnOnce() + 'static>;

/// Source of wall-clock time.
pub trait Clock {
    /// Returns the current time in epoch milliseconds.
    fn now(&self) -> EpochMillis;
}

/// Opaque registration returned by [`AlarmScheduler::schedule`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmHandle(pub u64);

impl fmt::Debug for AlarmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlarmHandle({})", self.0)
    }
}

/// One-shot timer service keyed by absolute wake time.
///
/// Alarms fire at most once, at or after their deadline. Cancelling an alarm
/// that already fired, or was already cancelled, must be a no-op.
pub trait AlarmScheduler {
    /// Registers `callback` to run at or after `at`.
    fn schedule(&self, at: EpochMillis, callback: AlarmCallback) -> AlarmHandle;

    /// Withdraws a registration made by [`schedule`](Self::schedule).
    fn cancel(&self, handle: AlarmHandle);
}

/// Runs listener notifications.
pub trait Executor {
    /// Runs `task`, now or later.
    fn execute(&self, task: Task);
}

/// Receives layout updates from a timeline manager.
pub trait Listener<T> {
    /// Called once per dispatch with the manager's token and the selected
    /// entry.
    fn on_layout_update(&self, token: i32, entry: &TimelineEntry<T>);
}

impl<T, F> Listener<T> for F
where
    F: Fn(i32, &TimelineEntry<T>),
{
    fn on_layout_update(&self, token: i32, entry: &TimelineEntry<T>) {
        self(token, entry);
    }
}

/// An [`Executor`] that runs each task immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}
