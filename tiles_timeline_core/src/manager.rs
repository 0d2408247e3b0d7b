// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timeline dispatch with throttled alarm rescheduling.
//!
//! The [`TimelineManager`] turns a [`Timeline`] into a stream of layout
//! updates. Each dispatch reads the [`Clock`], selects an entry through the
//! [`TimelineCache`], hands it to the [`Listener`] via the [`Executor`], and
//! arms a single alarm for when the selection goes stale. When that alarm
//! fires the cycle repeats, until [`close`](TimelineManager::close).
//!
//! ```text
//!   init() ──► dispatch ──► arm alarm ──► (alarm fires) ──► dispatch ──► …
//!                 │                                            │
//!                 └──► Executor ──► Listener                   └──► …
//! ```
//!
//! See the [`TimelineManager`] struct docs for lifecycle and throttling
//! details.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::Cell;
use core::fmt;

use crate::backend::{AlarmHandle, AlarmScheduler, Clock, Executor, Listener};
use crate::cache::TimelineCache;
use crate::time::{EpochMillis, Millis};
use crate::timeline::Timeline;
use crate::trace::{
    AlarmArmedEvent, AlarmCancelledEvent, AlarmFiredEvent, DispatchEvent, DispatchSkippedEvent,
    LifecycleEvent, SkipReason, Tracer, Transition,
};

/// Shortest gap between two dispatches of the same manager.
pub const MIN_TILE_UPDATE_DELAY: Millis = Millis::MINUTE;

/// Configuration for a [`TimelineManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Minimum time between a dispatch and the next one. Selections that go
    /// stale sooner are shown until this much time has passed.
    pub min_update_delay: Millis,
}

impl ManagerConfig {
    /// Production configuration: at most one update per
    /// [`MIN_TILE_UPDATE_DELAY`].
    #[must_use]
    pub const fn tiles() -> Self {
        Self {
            min_update_delay: MIN_TILE_UPDATE_DELAY,
        }
    }

    /// No throttling. Every change in the timeline is dispatched when it
    /// happens; intended for previews and tests.
    #[must_use]
    pub const fn unthrottled() -> Self {
        Self {
            min_update_delay: Millis::ZERO,
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::tiles()
    }
}

/// Lifecycle of a [`TimelineManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// Created, `init()` not called yet.
    Uninitialized,
    /// Dispatching and re-arming alarms.
    Active,
    /// Closed; inert for good.
    Closed,
}

/// Selects the timeline entry to show and keeps the selection current.
///
/// # Lifecycle
///
/// `Uninitialized → Active → Closed`. [`init`](Self::init) activates the
/// manager and dispatches immediately; calling it again re-dispatches.
/// [`close`](Self::close) withdraws the pending alarm and makes every later
/// call a no-op. Dropping the manager closes it.
///
/// # Throttling
///
/// The alarm for the next dispatch is armed at
/// `max(expiry, now + min_update_delay)`, so a tightly packed timeline
/// cannot update more often than [`ManagerConfig::min_update_delay`].
/// Selections that never expire arm no alarm at all.
///
/// # Alarms
///
/// At most one alarm is pending at any time. Each dispatch withdraws the
/// previous one before arming the next. A firing that arrives after its
/// alarm was superseded or the manager was closed (a scheduler that does not
/// honor cancellation promptly) is ignored.
///
/// # Threading
///
/// The manager is `!Send`: construction, `init`, `close` and every
/// collaborator callback happen on one thread. Callbacks may re-enter the
/// manager; a listener can close it from inside
/// [`on_layout_update`](Listener::on_layout_update).
///
/// # Usage
///
/// ```rust,ignore
/// let manager = TimelineManager::new(timeline, token, clock, alarms, executor, listener);
/// manager.init();
/// // ... host event loop fires alarms ...
/// manager.close();
/// ```
pub struct TimelineManager<T: 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: 'static> {
    cache: TimelineCache<T>,
    token: i32,
    config: ManagerConfig,
    clock: Box<dyn Clock>,
    alarms: Box<dyn AlarmScheduler>,
    executor: Box<dyn Executor>,
    listener: Box<dyn Listener<T>>,
    tracer: Tracer,
    state: Cell<ManagerState>,
    pending: Cell<Option<AlarmHandle>>,
    /// Bumped whenever the pending alarm is withdrawn or replaced; firings
    /// from an older generation are stale.
    generation: Cell<u64>,
}

impl<T: 'static> TimelineManager<T> {
    /// Creates a manager with [`ManagerConfig::tiles`] and no tracing.
    #[must_use]
    pub fn new(
        timeline: Timeline<T>,
        token: i32,
        clock: impl Clock + 'static,
        alarms: impl AlarmScheduler + 'static,
        executor: impl Executor + 'static,
        listener: impl Listener<T> + 'static,
    ) -> Self {
        Self::with_config(
            timeline,
            token,
            clock,
            alarms,
            executor,
            listener,
            ManagerConfig::tiles(),
            Tracer::none(),
        )
    }

    /// Creates a manager with an explicit configuration and tracer.
    #[must_use]
    pub fn with_config(
        timeline: Timeline<T>,
        token: i32,
        clock: impl Clock + 'static,
        alarms: impl AlarmScheduler + 'static,
        executor: impl Executor + 'static,
        listener: impl Listener<T> + 'static,
        config: ManagerConfig,
        tracer: Tracer,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                cache: TimelineCache::new(timeline),
                token,
                config,
                clock: Box::new(clock),
                alarms: Box::new(alarms),
                executor: Box::new(executor),
                listener: Box::new(listener),
                tracer,
                state: Cell::new(ManagerState::Uninitialized),
                pending: Cell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Activates the manager and dispatches the current entry.
    ///
    /// Calling it again re-dispatches. Does nothing once closed.
    pub fn init(&self) {
        let inner = &self.inner;
        if inner.state.get() == ManagerState::Closed {
            return;
        }
        inner.state.set(ManagerState::Active);
        inner.tracer.lifecycle(&LifecycleEvent {
            token: inner.token,
            transition: Transition::Init,
        });
        inner.dispatch();
    }

    /// Withdraws the pending alarm and shuts the manager down for good.
    ///
    /// Idempotent, and safe to call from inside a listener callback.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Selects the current entry, re-arms the alarm and notifies the
    /// listener.
    ///
    /// This is what `init()` and every alarm firing run. Hosts may call it
    /// directly to force a refresh; it does nothing unless the manager is
    /// active.
    pub fn dispatch_next_layout(&self) {
        self.inner.dispatch();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.inner.state.get()
    }

    /// Token passed to the listener with every update.
    #[must_use]
    pub fn token(&self) -> i32 {
        self.inner.token
    }

    /// The alarm currently armed, if any.
    #[must_use]
    pub fn pending_alarm(&self) -> Option<AlarmHandle> {
        self.inner.pending.get()
    }

    /// The lookup index over this manager's timeline.
    #[must_use]
    pub fn cache(&self) -> &TimelineCache<T> {
        &self.inner.cache
    }

    /// The configuration this manager was created with.
    #[must_use]
    pub fn config(&self) -> ManagerConfig {
        self.inner.config
    }
}

impl<T: 'static> Drop for TimelineManager<T> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

impl<T: 'static> fmt::Debug for TimelineManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineManager")
            .field("token", &self.inner.token)
            .field("state", &self.inner.state.get())
            .field("pending", &self.inner.pending.get())
            .field("entries", &self.inner.cache.len())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Inner<T> {
    fn dispatch(self: &Rc<Self>) {
        if self.state.get() != ManagerState::Active {
            self.tracer.dispatch_skipped(&DispatchSkippedEvent {
                token: self.token,
                reason: SkipReason::Inactive,
            });
            return;
        }

        // 1. Withdraw the previous alarm before anything else can fire.
        self.cancel_pending();

        // 2–3. Select.
        let now = self.clock.now();
        let Some(selection) = self.cache.select(now) else {
            self.tracer.dispatch_skipped(&DispatchSkippedEvent {
                token: self.token,
                reason: SkipReason::EmptyTimeline,
            });
            return;
        };

        // 4. Throttle.
        let expiry = self.cache.find_current_timeline_entry_expiry(selection.id, now);
        let next_dispatch = expiry.max(now.saturating_add(self.config.min_update_delay));
        self.tracer.dispatch(&DispatchEvent {
            token: self.token,
            now,
            entry: selection.id,
            kind: selection.kind,
            expiry,
            next_dispatch,
        });

        // 5. Re-arm. If the alarm fired inline, the nested dispatch already
        // notified the listener with a newer selection.
        if !next_dispatch.is_never() && !self.arm(next_dispatch) {
            return;
        }

        // 6. Notify, unless the manager is gone or closed by the time the
        // executor gets to it.
        let entry = self.cache.shared_entry(selection.id);
        let weak = Rc::downgrade(self);
        self.executor.execute(Box::new(move || {
            if let Some(inner) = weak.upgrade()
                && inner.state.get() == ManagerState::Active
            {
                inner.listener.on_layout_update(inner.token, &entry);
            }
        }));
    }

    /// Registers the next alarm. Returns `false` if the registration was
    /// superseded before `schedule` returned.
    fn arm(self: &Rc<Self>, at: EpochMillis) -> bool {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.alarms.schedule(
            at,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_alarm(generation, at);
                }
            }),
        );

        // A scheduler may fire inline, in which case that firing already
        // dispatched and armed its own alarm.
        if self.generation.get() != generation || self.state.get() != ManagerState::Active {
            return false;
        }
        self.pending.set(Some(handle));
        self.tracer.alarm_armed(&AlarmArmedEvent {
            token: self.token,
            handle,
            at,
        });
        true
    }

    fn on_alarm(self: &Rc<Self>, generation: u64, at: EpochMillis) {
        let stale =
            self.state.get() != ManagerState::Active || self.generation.get() != generation;
        self.tracer.alarm_fired(&AlarmFiredEvent {
            token: self.token,
            at,
            stale,
        });
        if stale {
            return;
        }
        // The scheduler has consumed this registration.
        self.pending.set(None);
        self.dispatch();
    }

    fn cancel_pending(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        if let Some(handle) = self.pending.take() {
            self.alarms.cancel(handle);
            self.tracer.alarm_cancelled(&AlarmCancelledEvent {
                token: self.token,
                handle,
            });
        }
    }

    fn close(&self) {
        if self.state.get() == ManagerState::Closed {
            return;
        }
        self.state.set(ManagerState::Closed);
        self.cancel_pending();
        self.tracer.lifecycle(&LifecycleEvent {
            token: self.token,
            transition: Transition::Close,
        });
    }
}
