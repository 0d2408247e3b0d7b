// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated day of tile updates that exercises the tracing pipeline.
//!
//! Two tiles share one simulated clock and alarm scheduler: an hourly
//! forecast and a calendar with a few meetings. Events go to both a
//! [`PrettyPrintSink`](tiles_timeline_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](tiles_timeline_debug::recorder::RecorderSink); the
//! recording is exported as a Chrome trace JSON file at the end.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use tiles_timeline_core::manager::ManagerConfig;
use tiles_timeline_core::time::{EpochMillis, Millis};
use tiles_timeline_core::timeline::{Timeline, TimelineEntry};
use tiles_timeline_core::trace::{
    AlarmArmedEvent, AlarmCancelledEvent, AlarmFiredEvent, DispatchEvent, DispatchSkippedEvent,
    LifecycleEvent, TraceSink, Tracer,
};
use tiles_timeline_debug::pretty::PrettyPrintSink;
use tiles_timeline_debug::recorder::RecorderSink;
use tiles_timeline_harness::{RecordingListener, Simulation};

const HOUR: i64 = 3_600_000;
const FORECAST_TOKEN: i32 = 1;
const CALENDAR_TOKEN: i32 = 2;

/// Forwards every event to both sinks.
struct Tee {
    pretty: Rc<RefCell<PrettyPrintSink>>,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Tee {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.pretty.on_lifecycle(e);
        self.recorder.on_lifecycle(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.pretty.on_dispatch(e);
        self.recorder.on_dispatch(e);
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        self.pretty.on_dispatch_skipped(e);
        self.recorder.on_dispatch_skipped(e);
    }

    fn on_alarm_armed(&mut self, e: &AlarmArmedEvent) {
        self.pretty.on_alarm_armed(e);
        self.recorder.on_alarm_armed(e);
    }

    fn on_alarm_cancelled(&mut self, e: &AlarmCancelledEvent) {
        self.pretty.on_alarm_cancelled(e);
        self.recorder.on_alarm_cancelled(e);
    }

    fn on_alarm_fired(&mut self, e: &AlarmFiredEvent) {
        self.pretty.on_alarm_fired(e);
        self.recorder.on_alarm_fired(e);
    }
}

fn window(payload: String, start: EpochMillis, hours: i64) -> TimelineEntry<String> {
    TimelineEntry::with_window(payload, start, start + Millis(hours * HOUR))
        .expect("demo windows are never inverted")
}

fn main() {
    // Start the simulated day at the most recent UTC midnight.
    let wall = tiles_timeline_backend_std::now();
    let midnight = EpochMillis(wall.millis() - wall.millis().rem_euclid(24 * HOUR));
    let at = |hour: i64| midnight + Millis(hour * HOUR);

    // -- sinks -------------------------------------------------------------
    let pretty = Rc::new(RefCell::new(PrettyPrintSink::new(Box::new(std::io::stdout()))));
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let tracer = || {
        Tracer::new(Box::new(Tee {
            pretty: Rc::clone(&pretty),
            recorder: Rc::clone(&recorder),
        }))
    };

    // -- timelines ---------------------------------------------------------
    let forecast: Timeline<String> = (0..24)
        .map(|hour| window(format!("forecast {hour:02}:00"), at(hour), 1))
        .collect();

    let mut calendar = Timeline::single(String::from("no meetings"));
    calendar.push(window(String::from("standup"), at(9), 1));
    calendar.push(window(String::from("design review"), at(13), 2));
    calendar.push(window(String::from("1:1"), at(14), 1));

    // -- managers ----------------------------------------------------------
    let sim = Simulation::new(midnight);
    let forecast_log = RecordingListener::new();
    let calendar_log = RecordingListener::new();
    let forecast_tile = sim.manager_with_config(
        forecast,
        FORECAST_TOKEN,
        forecast_log.clone(),
        ManagerConfig::tiles(),
        tracer(),
    );
    let calendar_tile = sim.manager_with_config(
        calendar,
        CALENDAR_TOKEN,
        calendar_log.clone(),
        ManagerConfig::tiles(),
        tracer(),
    );

    forecast_tile.init();
    calendar_tile.init();

    // -- simulated day -----------------------------------------------------
    let fired = sim.advance_to(at(16));

    // The forecast tile is removed mid-afternoon. A scheduler that misses
    // the cancellation still fires the old alarm, which is ignored.
    forecast_tile.close();
    sim.clock().set(at(17));
    let replayed = sim.alarms().replay_cancelled();

    let fired = fired + sim.advance_to(at(24));
    drop(calendar_tile);

    // -- export Chrome trace -----------------------------------------------
    let path = "timeline_trace.json";
    let file = File::create(path).expect("failed to create timeline_trace.json");
    let mut writer = BufWriter::new(file);
    tiles_timeline_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({} forecast updates, {} calendar updates, {fired} alarms fired, \
         {replayed} stale replays)",
        forecast_log.len(),
        calendar_log.len(),
    );
}
