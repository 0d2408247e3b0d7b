// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each prefixed by a one-byte
//! tag. [`decode`] reads them back as an iterator of [`RecordedEvent`].

use tiles_timeline_core::backend::AlarmHandle;
use tiles_timeline_core::cache::SelectionKind;
use tiles_timeline_core::time::EpochMillis;
use tiles_timeline_core::timeline::TimelineEntryId;
use tiles_timeline_core::trace::{
    AlarmArmedEvent, AlarmCancelledEvent, AlarmFiredEvent, DispatchEvent, DispatchSkippedEvent,
    LifecycleEvent, SkipReason, TraceSink, Transition,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LIFECYCLE: u8 = 1;
const TAG_DISPATCH: u8 = 2;
const TAG_DISPATCH_SKIPPED: u8 = 3;
const TAG_ALARM_ARMED: u8 = 4;
const TAG_ALARM_CANCELLED: u8 = 5;
const TAG_ALARM_FIRED: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_time(&mut self, t: EpochMillis) {
        self.buf.extend_from_slice(&t.millis().to_le_bytes());
    }
}

impl TraceSink for RecorderSink {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.write_u8(TAG_LIFECYCLE);
        self.write_i32(e.token);
        self.write_u8(match e.transition {
            Transition::Init => 0,
            Transition::Close => 1,
        });
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_i32(e.token);
        self.write_time(e.now);
        self.write_u64(u64::try_from(e.entry.index()).unwrap_or(u64::MAX));
        self.write_u8(match e.kind {
            SelectionKind::Exact => 0,
            SelectionKind::Closest => 1,
        });
        self.write_time(e.expiry);
        self.write_time(e.next_dispatch);
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        self.write_u8(TAG_DISPATCH_SKIPPED);
        self.write_i32(e.token);
        self.write_u8(match e.reason {
            SkipReason::EmptyTimeline => 0,
            SkipReason::Inactive => 1,
        });
    }

    fn on_alarm_armed(&mut self, e: &AlarmArmedEvent) {
        self.write_u8(TAG_ALARM_ARMED);
        self.write_i32(e.token);
        self.write_u64(e.handle.0);
        self.write_time(e.at);
    }

    fn on_alarm_cancelled(&mut self, e: &AlarmCancelledEvent) {
        self.write_u8(TAG_ALARM_CANCELLED);
        self.write_i32(e.token);
        self.write_u64(e.handle.0);
    }

    fn on_alarm_fired(&mut self, e: &AlarmFiredEvent) {
        self.write_u8(TAG_ALARM_FIRED);
        self.write_i32(e.token);
        self.write_time(e.at);
        self.write_u8(u8::from(e.stale));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`LifecycleEvent`].
    Lifecycle(LifecycleEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`DispatchSkippedEvent`].
    DispatchSkipped(DispatchSkippedEvent),
    /// An [`AlarmArmedEvent`].
    AlarmArmed(AlarmArmedEvent),
    /// An [`AlarmCancelledEvent`].
    AlarmCancelled(AlarmCancelledEvent),
    /// An [`AlarmFiredEvent`].
    AlarmFired(AlarmFiredEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<EpochMillis> {
        self.read_array().map(i64::from_le_bytes).map(EpochMillis)
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Lifecycle(LifecycleEvent {
            token: self.read_i32()?,
            transition: match self.read_u8()? {
                0 => Transition::Init,
                _ => Transition::Close,
            },
        }))
    }

    fn decode_dispatch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Dispatch(DispatchEvent {
            token: self.read_i32()?,
            now: self.read_time()?,
            entry: TimelineEntryId::from_index(usize::try_from(self.read_u64()?).ok()?),
            kind: match self.read_u8()? {
                0 => SelectionKind::Exact,
                _ => SelectionKind::Closest,
            },
            expiry: self.read_time()?,
            next_dispatch: self.read_time()?,
        }))
    }

    fn decode_dispatch_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DispatchSkipped(DispatchSkippedEvent {
            token: self.read_i32()?,
            reason: match self.read_u8()? {
                0 => SkipReason::EmptyTimeline,
                _ => SkipReason::Inactive,
            },
        }))
    }

    fn decode_alarm_armed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AlarmArmed(AlarmArmedEvent {
            token: self.read_i32()?,
            handle: AlarmHandle(self.read_u64()?),
            at: self.read_time()?,
        }))
    }

    fn decode_alarm_cancelled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AlarmCancelled(AlarmCancelledEvent {
            token: self.read_i32()?,
            handle: AlarmHandle(self.read_u64()?),
        }))
    }

    fn decode_alarm_fired(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AlarmFired(AlarmFiredEvent {
            token: self.read_i32()?,
            at: self.read_time()?,
            stale: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LIFECYCLE => self.decode_lifecycle(),
            TAG_DISPATCH => self.decode_dispatch(),
            TAG_DISPATCH_SKIPPED => self.decode_dispatch_skipped(),
            TAG_ALARM_ARMED => self.decode_alarm_armed(),
            TAG_ALARM_CANCELLED => self.decode_alarm_cancelled(),
            TAG_ALARM_FIRED => self.decode_alarm_fired(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dispatch() -> DispatchEvent {
        DispatchEvent {
            token: -4,
            now: EpochMillis(1_700_000_000_000),
            entry: TimelineEntryId::from_index(2),
            kind: SelectionKind::Closest,
            expiry: EpochMillis(1_700_000_030_000),
            next_dispatch: EpochMillis(1_700_000_060_000),
        }
    }

    #[test]
    fn dispatch_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_dispatch();
        rec.on_dispatch(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Dispatch(e) => {
                assert_eq!(e.token, orig.token);
                assert_eq!(e.now, orig.now);
                assert_eq!(e.entry, orig.entry);
                assert_eq!(e.kind, orig.kind);
                assert_eq!(e.expiry, orig.expiry);
                assert_eq!(e.next_dispatch, orig.next_dispatch);
            }
            other => panic!("expected Dispatch, got {other:?}"),
        }
    }

    #[test]
    fn alarm_sequence_keeps_order() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            token: 1,
            transition: Transition::Init,
        });
        rec.on_alarm_armed(&AlarmArmedEvent {
            token: 1,
            handle: AlarmHandle(7),
            at: EpochMillis::MAX,
        });
        rec.on_alarm_cancelled(&AlarmCancelledEvent {
            token: 1,
            handle: AlarmHandle(7),
        });
        rec.on_alarm_fired(&AlarmFiredEvent {
            token: 1,
            at: EpochMillis(60_000),
            stale: true,
        });
        rec.on_dispatch_skipped(&DispatchSkippedEvent {
            token: 1,
            reason: SkipReason::Inactive,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(
            events[0],
            RecordedEvent::Lifecycle(LifecycleEvent {
                transition: Transition::Init,
                ..
            })
        ));
        match &events[1] {
            RecordedEvent::AlarmArmed(e) => {
                assert_eq!(e.handle, AlarmHandle(7));
                assert!(e.at.is_never());
            }
            other => panic!("expected AlarmArmed, got {other:?}"),
        }
        assert!(matches!(events[2], RecordedEvent::AlarmCancelled(_)));
        assert!(matches!(
            events[3],
            RecordedEvent::AlarmFired(AlarmFiredEvent { stale: true, .. })
        ));
        assert!(matches!(
            events[4],
            RecordedEvent::DispatchSkipped(DispatchSkippedEvent {
                reason: SkipReason::Inactive,
                ..
            })
        ));
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_dispatch(&sample_dispatch());
        rec.on_dispatch(&sample_dispatch());
        let bytes = rec.into_bytes();

        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_alarm_cancelled(&AlarmCancelledEvent {
            token: 0,
            handle: AlarmHandle(1),
        });
        let mut bytes = rec.into_bytes();
        bytes.push(0xff);
        bytes.extend_from_slice(&[0; 16]);
        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn empty_input() {
        assert_eq!(decode(&[]).count(), 0);
    }
}
