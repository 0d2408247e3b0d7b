// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tiles_timeline_core::backend::{Clock, InlineExecutor, Listener};
use tiles_timeline_core::manager::{ManagerConfig, TimelineManager};
use tiles_timeline_core::time::{EpochMillis, Millis};
use tiles_timeline_core::timeline::Timeline;
use tiles_timeline_core::trace::Tracer;

use crate::{FakeClock, ManualAlarmScheduler};

/// A fake clock and a manual alarm scheduler moving in lockstep.
///
/// Managers built with [`manager`](Self::manager) share the simulation's
/// clock and scheduler and deliver updates inline. Advancing the simulation
/// steps the clock to each due alarm in deadline order and fires it there,
/// so every dispatch observes the time its alarm was armed for.
#[derive(Clone, Debug, Default)]
pub struct Simulation {
    clock: FakeClock,
    alarms: ManualAlarmScheduler,
}

impl Simulation {
    /// Creates a simulation starting at `start`.
    #[must_use]
    pub fn new(start: EpochMillis) -> Self {
        Self {
            clock: FakeClock::new(start),
            alarms: ManualAlarmScheduler::new(),
        }
    }

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> EpochMillis {
        self.clock.now()
    }

    /// The shared clock.
    #[must_use]
    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    /// The shared scheduler.
    #[must_use]
    pub fn alarms(&self) -> &ManualAlarmScheduler {
        &self.alarms
    }

    /// Builds a manager wired to this simulation with the production
    /// configuration.
    #[must_use]
    pub fn manager<T: 'static>(
        &self,
        timeline: Timeline<T>,
        token: i32,
        listener: impl Listener<T> + 'static,
    ) -> TimelineManager<T> {
        self.manager_with_config(timeline, token, listener, ManagerConfig::tiles(), Tracer::none())
    }

    /// Builds a manager wired to this simulation.
    #[must_use]
    pub fn manager_with_config<T: 'static>(
        &self,
        timeline: Timeline<T>,
        token: i32,
        listener: impl Listener<T> + 'static,
        config: ManagerConfig,
        tracer: Tracer,
    ) -> TimelineManager<T> {
        TimelineManager::with_config(
            timeline,
            token,
            self.clock.clone(),
            self.alarms.clone(),
            InlineExecutor,
            listener,
            config,
            tracer,
        )
    }

    /// Moves the clock to `target`, firing every alarm due on the way.
    ///
    /// Returns how many alarms fired. Moving backwards fires nothing.
    pub fn advance_to(&self, target: EpochMillis) -> usize {
        let mut fired = 0;
        while let Some(at) = self.alarms.next_deadline()
            && at <= target
        {
            if at > self.clock.now() {
                self.clock.set(at);
            }
            if self.alarms.fire_next_due(self.clock.now()).is_some() {
                fired += 1;
            }
        }
        self.clock.set(target);
        fired
    }

    /// Moves the clock forward by `span`, firing every alarm due on the way.
    pub fn advance_by(&self, span: Millis) -> usize {
        self.advance_to(self.clock.now().saturating_add(span))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use tiles_timeline_core::cache::TimelineCache;
    use tiles_timeline_core::manager::{MIN_TILE_UPDATE_DELAY, ManagerState};
    use tiles_timeline_core::timeline::{TimelineEntry, Validity};

    use super::*;
    use crate::RecordingListener;

    fn window(payload: &'static str, start: i64, end: i64) -> TimelineEntry<&'static str> {
        TimelineEntry::new(payload, Validity::new(EpochMillis(start), EpochMillis(end)))
    }

    #[test]
    fn single_window_selection_and_expiry() {
        let cache = TimelineCache::new(Timeline::from_iter([window("only", 0, 100)]));
        let now = EpochMillis(50);
        let id = cache.find_timeline_entry_for_time(now).expect("window contains t=50");
        assert_eq!(*cache.entry(id).payload(), "only");
        assert_eq!(
            cache.find_current_timeline_entry_expiry(id, now),
            EpochMillis(100)
        );
    }

    #[test]
    fn nested_shorter_window_wins() {
        let cache = TimelineCache::new(Timeline::from_iter([
            window("a", 0, 1_000),
            window("b", 400, 500),
        ]));
        let now = EpochMillis(450);
        let id = cache.find_timeline_entry_for_time(now).expect("two windows contain t=450");
        assert_eq!(*cache.entry(id).payload(), "b");
        assert_eq!(
            cache.find_current_timeline_entry_expiry(id, now),
            EpochMillis(500)
        );
    }

    #[test]
    fn empty_timeline_dispatches_nothing() {
        let sim = Simulation::new(EpochMillis(0));
        let listener = RecordingListener::<&'static str>::new();
        let manager = sim.manager(Timeline::new(), 1, listener.clone());

        manager.init();
        manager.dispatch_next_layout();

        assert!(listener.is_empty());
        assert_eq!(sim.alarms().pending_len(), 0);
        assert!(sim.alarms().history().is_empty());
        assert_eq!(manager.pending_alarm(), None);
    }

    #[test]
    fn short_expiry_is_throttled_to_a_minute() {
        let t = 1_000_000;
        let sim = Simulation::new(EpochMillis(t));
        let listener = RecordingListener::new();
        let manager = sim.manager(
            Timeline::from_iter([window("blink", t - 5, t + 10), window("later", t + 10, t + 500_000)]),
            1,
            listener.clone(),
        );

        manager.init();

        assert_eq!(listener.payloads(), ["blink"]);
        assert_eq!(
            sim.alarms().pending(),
            [(manager.pending_alarm().expect("armed"), EpochMillis(t + 60_000))]
        );

        assert_eq!(sim.advance_by(Millis(59_999)), 0);
        assert_eq!(listener.len(), 1);
        assert_eq!(sim.advance_by(Millis(1)), 1);
        assert_eq!(listener.payloads(), ["blink", "later"]);
    }

    #[test]
    fn close_silences_a_late_firing() {
        let sim = Simulation::new(EpochMillis(0));
        let listener = RecordingListener::new();
        let manager = sim.manager(
            Timeline::from_iter([window("a", 0, 100_000), window("b", 100_000, 200_000)]),
            1,
            listener.clone(),
        );
        manager.init();
        assert!(manager.pending_alarm().is_some());
        listener.clear();

        manager.close();
        assert_eq!(manager.state(), ManagerState::Closed);
        assert_eq!(manager.pending_alarm(), None);
        assert_eq!(sim.alarms().pending_len(), 0);

        // A scheduler that ignored the cancel still delivers the callback.
        sim.clock().set(EpochMillis(100_000));
        assert_eq!(sim.alarms().replay_cancelled(), 1);
        assert!(listener.is_empty());
        assert_eq!(sim.alarms().pending_len(), 0);
    }

    #[test]
    fn repeated_dispatch_is_idempotent() {
        let sim = Simulation::new(EpochMillis(250));
        let listener = RecordingListener::new();
        let manager = sim.manager(
            Timeline::from_iter([window("a", 0, 100_000), window("b", 200, 300)]),
            9,
            listener.clone(),
        );

        manager.init();
        let first = manager.pending_alarm().expect("armed by init");
        manager.dispatch_next_layout();
        let second = manager.pending_alarm().expect("armed by second dispatch");

        assert_eq!(listener.payloads(), ["b", "b"]);
        assert_ne!(first, second);
        assert_eq!(sim.alarms().pending(), [(second, EpochMillis(60_250))]);

        let history = sim.alarms().history();
        assert_eq!(history.len(), 2);
        assert!(history[0].cancelled);
        assert_eq!(history[0].at, history[1].at);

        // The superseded registration stays silent even if replayed.
        assert_eq!(sim.alarms().replay_cancelled(), 1);
        assert_eq!(listener.len(), 2);
        assert_eq!(manager.pending_alarm(), Some(second));
    }

    #[test]
    fn day_of_updates_follows_the_timeline() {
        let hour = 3_600_000;
        let sim = Simulation::new(EpochMillis(0));
        let listener = RecordingListener::new();
        let manager = sim.manager(
            Timeline::from_iter([
                TimelineEntry::always("idle"),
                window("morning", 8 * hour, 12 * hour),
                window("meeting", 9 * hour, 10 * hour),
                window("evening", 18 * hour, 22 * hour),
            ]),
            3,
            listener.clone(),
        );

        manager.init();
        sim.advance_to(EpochMillis(24 * hour));

        assert_eq!(
            listener.payloads(),
            ["idle", "morning", "meeting", "morning", "idle", "evening", "idle"]
        );
        let tokens: Vec<i32> = listener.deliveries().iter().map(|d| d.token).collect();
        assert_eq!(tokens, vec![3; 7]);
        assert_eq!(
            manager.pending_alarm(),
            None,
            "the default entry never expires once the last window closes"
        );
    }

    #[test]
    fn fallback_hands_over_past_the_gap_midpoint() {
        let sim = Simulation::new(EpochMillis(0));
        let listener = RecordingListener::new();
        let manager = sim.manager_with_config(
            Timeline::from_iter([window("a", 100, 200), window("b", 400, 500)]),
            1,
            listener.clone(),
            ManagerConfig::unthrottled(),
            Tracer::none(),
        );

        manager.init();
        sim.advance_to(EpochMillis(1_000));

        // "a" stays selected while it opens and closes, and keeps the tie at
        // the midpoint of the gap. "b" never expires.
        assert_eq!(listener.payloads(), ["a", "b"]);
        let alarm_times: Vec<EpochMillis> =
            sim.alarms().history().iter().map(|r| r.at).collect();
        assert_eq!(alarm_times, [EpochMillis(301)]);
        assert_eq!(manager.pending_alarm(), None);
    }

    #[test]
    fn throttle_never_exceeds_one_update_per_minute() {
        let sim = Simulation::new(EpochMillis(0));
        let listener = RecordingListener::new();
        let timeline: Timeline<i64> = (0..600)
            .map(|i| {
                TimelineEntry::new(i, Validity::new(EpochMillis(i * 1_000), EpochMillis((i + 1) * 1_000)))
            })
            .collect();
        let manager = sim.manager(timeline, 1, listener.clone());

        manager.init();
        sim.advance_to(EpochMillis(590_000));

        let history = sim.alarms().history();
        for pair in history.windows(2) {
            assert!(
                pair[1].at.saturating_since(pair[0].at) >= MIN_TILE_UPDATE_DELAY,
                "alarms {:?} and {:?} are closer than the minimum delay",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(listener.payloads(), [0, 60, 120, 180, 240, 300, 360, 420, 480, 540]);
        assert_eq!(sim.alarms().next_deadline(), Some(EpochMillis(600_000)));
        drop(manager);
        assert_eq!(sim.alarms().pending_len(), 0, "dropping the manager withdraws its alarm");
    }
}
