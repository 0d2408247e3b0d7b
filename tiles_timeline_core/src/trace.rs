// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for timeline managers.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! manager emits while it selects entries and arms alarms. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Non-fatal conditions (an empty timeline, a stale alarm firing) are
//! reported only through these events; the manager never returns an error
//! for them.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use crate::backend::AlarmHandle;
use crate::cache::SelectionKind;
use crate::time::EpochMillis;
use crate::timeline::TimelineEntryId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A manager lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// `init()` was called.
    Init,
    /// `close()` was called on an open manager.
    Close,
}

/// Why a dispatch produced no layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The timeline has no entries.
    EmptyTimeline,
    /// The manager was not initialized, or already closed.
    Inactive,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted on `init()` and on the first `close()`.
#[derive(Clone, Copy, Debug)]
pub struct LifecycleEvent {
    /// Token of the manager.
    pub token: i32,
    /// Which transition happened.
    pub transition: Transition,
}

/// Emitted when an entry is selected and handed to the executor.
#[derive(Clone, Copy, Debug)]
pub struct DispatchEvent {
    /// Token of the manager.
    pub token: i32,
    /// Clock reading used for the selection.
    pub now: EpochMillis,
    /// The selected entry.
    pub entry: TimelineEntryId,
    /// Whether the entry was active or a fallback.
    pub kind: SelectionKind,
    /// When the selection goes stale, before throttling.
    pub expiry: EpochMillis,
    /// When the next dispatch will run, after throttling. `MAX` if never.
    pub next_dispatch: EpochMillis,
}

/// Emitted when a dispatch finds nothing to show.
#[derive(Clone, Copy, Debug)]
pub struct DispatchSkippedEvent {
    /// Token of the manager.
    pub token: i32,
    /// Why nothing was dispatched.
    pub reason: SkipReason,
}

/// Emitted after an alarm is registered with the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct AlarmArmedEvent {
    /// Token of the manager.
    pub token: i32,
    /// Handle returned by the scheduler.
    pub handle: AlarmHandle,
    /// Deadline of the alarm.
    pub at: EpochMillis,
}

/// Emitted after a pending alarm is withdrawn.
#[derive(Clone, Copy, Debug)]
pub struct AlarmCancelledEvent {
    /// Token of the manager.
    pub token: i32,
    /// Handle that was cancelled.
    pub handle: AlarmHandle,
}

/// Emitted when an alarm callback runs.
#[derive(Clone, Copy, Debug)]
pub struct AlarmFiredEvent {
    /// Token of the manager.
    pub token: i32,
    /// Deadline the alarm was armed for.
    pub at: EpochMillis,
    /// `true` if the alarm had been superseded or the manager closed, in
    /// which case the firing is ignored.
    pub stale: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from timeline managers.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on `init()` and `close()`.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        _ = e;
    }

    /// Called when an entry is dispatched.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called when a dispatch finds nothing to show.
    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        _ = e;
    }

    /// Called when an alarm is armed.
    fn on_alarm_armed(&mut self, e: &AlarmArmedEvent) {
        _ = e;
    }

    /// Called when a pending alarm is cancelled.
    fn on_alarm_cancelled(&mut self, e: &AlarmCancelledEvent) {
        _ = e;
    }

    /// Called when an alarm fires.
    fn on_alarm_fired(&mut self, e: &AlarmFiredEvent) {
        _ = e;
    }
}

/// Shares one sink between several managers, or keeps it readable after it
/// was handed to a manager.
impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.borrow_mut().on_lifecycle(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.borrow_mut().on_dispatch(e);
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        self.borrow_mut().on_dispatch_skipped(e);
    }

    fn on_alarm_armed(&mut self, e: &AlarmArmedEvent) {
        self.borrow_mut().on_alarm_armed(e);
    }

    fn on_alarm_cancelled(&mut self, e: &AlarmCancelledEvent) {
        self.borrow_mut().on_alarm_cancelled(e);
    }

    fn on_alarm_fired(&mut self, e: &AlarmFiredEvent) {
        self.borrow_mut().on_alarm_fired(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink. Methods take `&self` because managers emit
/// events from `&self` methods; an event raised while the sink is already
/// busy is dropped.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<RefCell<Box<dyn TraceSink>>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self {
                sink: Some(RefCell::new(sink)),
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    #[cfg(feature = "trace")]
    #[inline]
    fn emit(&self, f: impl FnOnce(&mut dyn TraceSink)) {
        if let Some(cell) = &self.sink
            && let Ok(mut sink) = cell.try_borrow_mut()
        {
            f(&mut **sink);
        }
    }

    /// Emits a [`LifecycleEvent`].
    #[inline]
    pub fn lifecycle(&self, e: &LifecycleEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_lifecycle(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_dispatch(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchSkippedEvent`].
    #[inline]
    pub fn dispatch_skipped(&self, e: &DispatchSkippedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_dispatch_skipped(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AlarmArmedEvent`].
    #[inline]
    pub fn alarm_armed(&self, e: &AlarmArmedEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_alarm_armed(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AlarmCancelledEvent`].
    #[inline]
    pub fn alarm_cancelled(&self, e: &AlarmCancelledEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_alarm_cancelled(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AlarmFiredEvent`].
    #[inline]
    pub fn alarm_fired(&self, e: &AlarmFiredEvent) {
        #[cfg(feature = "trace")]
        self.emit(|s| s.on_alarm_fired(e));
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
