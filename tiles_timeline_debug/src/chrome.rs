// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each manager token becomes a process row. A dispatch becomes a slice that
//! spans from the selection time to the next scheduled dispatch, so the
//! timeline of displayed entries reads left to right.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tiles_timeline_core::time::EpochMillis;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Epoch milliseconds are converted to microseconds. Events that carry no
/// timestamp of their own (lifecycle, skips, cancellations) are placed at the
/// most recent time seen earlier in the recording.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Lifecycle(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.transition),
                    "cat": "Lifecycle",
                    "ts": last_ts,
                    "pid": e.token,
                    "tid": 0,
                    "s": "p",
                }));
            }
            RecordedEvent::Dispatch(e) => {
                let ts = millis_to_us(e.now);
                last_ts = ts;
                let mut event = json!({
                    "ph": "i",
                    "name": format!("entry {}", e.entry.index()),
                    "cat": "Dispatch",
                    "ts": ts,
                    "pid": e.token,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "kind": format!("{:?}", e.kind),
                        "expiry_ms": finite_millis(e.expiry),
                        "next_dispatch_ms": finite_millis(e.next_dispatch),
                    }
                });
                if !e.next_dispatch.is_never() {
                    event["ph"] = json!("X");
                    event["dur"] = json!(millis_to_us(e.next_dispatch) - ts);
                    if let Some(fields) = event.as_object_mut() {
                        fields.remove("s");
                    }
                }
                events.push(event);
            }
            RecordedEvent::DispatchSkipped(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DispatchSkipped",
                    "cat": "Dispatch",
                    "ts": last_ts,
                    "pid": e.token,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "reason": format!("{:?}", e.reason),
                    }
                }));
            }
            RecordedEvent::AlarmArmed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "AlarmArmed",
                    "cat": "Alarm",
                    "ts": last_ts,
                    "pid": e.token,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "handle": e.handle.0,
                        "at_ms": finite_millis(e.at),
                    }
                }));
            }
            RecordedEvent::AlarmCancelled(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "AlarmCancelled",
                    "cat": "Alarm",
                    "ts": last_ts,
                    "pid": e.token,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "handle": e.handle.0,
                    }
                }));
            }
            RecordedEvent::AlarmFired(e) => {
                let ts = millis_to_us(e.at);
                last_ts = ts;
                events.push(json!({
                    "ph": "i",
                    "name": if e.stale { "AlarmFiredStale" } else { "AlarmFired" },
                    "cat": "Alarm",
                    "ts": ts,
                    "pid": e.token,
                    "tid": 1,
                    "s": "t",
                    "args": {
                        "stale": e.stale,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn millis_to_us(t: EpochMillis) -> f64 {
    t.millis() as f64 * 1000.0
}

fn finite_millis(t: EpochMillis) -> Option<i64> {
    (!t.is_never()).then_some(t.millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use tiles_timeline_core::backend::AlarmHandle;
    use tiles_timeline_core::cache::SelectionKind;
    use tiles_timeline_core::timeline::TimelineEntryId;
    use tiles_timeline_core::trace::{
        AlarmArmedEvent, AlarmFiredEvent, DispatchEvent, LifecycleEvent, TraceSink, Transition,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            token: 5,
            transition: Transition::Init,
        });
        rec.on_dispatch(&DispatchEvent {
            token: 5,
            now: EpochMillis(1_000),
            entry: TimelineEntryId::from_index(0),
            kind: SelectionKind::Exact,
            expiry: EpochMillis(30_000),
            next_dispatch: EpochMillis(61_000),
        });
        rec.on_alarm_armed(&AlarmArmedEvent {
            token: 5,
            handle: AlarmHandle(0),
            at: EpochMillis(61_000),
        });
        rec.on_alarm_fired(&AlarmFiredEvent {
            token: 5,
            at: EpochMillis(61_000),
            stale: false,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["name"], "Init");
        assert_eq!(parsed[0]["pid"], 5);

        // The dispatch spans until the next scheduled dispatch.
        assert_eq!(parsed[1]["ph"], "X");
        assert_eq!(parsed[1]["name"], "entry 0");
        assert_eq!(parsed[1]["ts"], 1_000_000.0);
        assert_eq!(parsed[1]["dur"], 60_000_000.0);
        assert_eq!(parsed[1]["args"]["expiry_ms"], 30_000);

        // Armed alarms inherit the dispatch time.
        assert_eq!(parsed[2]["ts"], 1_000_000.0);
        assert_eq!(parsed[3]["name"], "AlarmFired");
        assert_eq!(parsed[3]["ts"], 61_000_000.0);
    }

    #[test]
    fn never_expiring_dispatch_is_an_instant() {
        let mut rec = RecorderSink::new();
        rec.on_dispatch(&DispatchEvent {
            token: 1,
            now: EpochMillis(10),
            entry: TimelineEntryId::from_index(0),
            kind: SelectionKind::Exact,
            expiry: EpochMillis::MAX,
            next_dispatch: EpochMillis::MAX,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["ph"], "i");
        assert!(parsed[0]["args"]["next_dispatch_ms"].is_null());
        assert!(parsed[0].get("dur").is_none());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
