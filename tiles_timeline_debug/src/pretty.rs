// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed as epoch milliseconds, or `never` for the no-expiry sentinel.

use std::fmt;
use std::io::Write;

use tiles_timeline_core::cache::SelectionKind;
use tiles_timeline_core::time::EpochMillis;
use tiles_timeline_core::trace::{
    AlarmArmedEvent, AlarmCancelledEvent, AlarmFiredEvent, DispatchEvent, DispatchSkippedEvent,
    LifecycleEvent, SkipReason, TraceSink, Transition,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

struct Time(EpochMillis);

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_never() {
            f.write_str("never")
        } else {
            write!(f, "{}ms", self.0.millis())
        }
    }
}

fn kind_name(kind: SelectionKind) -> &'static str {
    match kind {
        SelectionKind::Exact => "exact",
        SelectionKind::Closest => "closest",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let name = match e.transition {
            Transition::Init => "init",
            Transition::Close => "close",
        };
        let _ = writeln!(self.writer, "[{name}] token={}", e.token);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] token={} now={} entry={} {} expiry={} next={}",
            e.token,
            Time(e.now),
            e.entry.index(),
            kind_name(e.kind),
            Time(e.expiry),
            Time(e.next_dispatch),
        );
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        let reason = match e.reason {
            SkipReason::EmptyTimeline => "empty timeline",
            SkipReason::Inactive => "inactive",
        };
        let _ = writeln!(self.writer, "[skip] token={} {reason}", e.token);
    }

    fn on_alarm_armed(&mut self, e: &AlarmArmedEvent) {
        let _ = writeln!(
            self.writer,
            "[alarm:arm] token={} handle={} at={}",
            e.token,
            e.handle.0,
            Time(e.at),
        );
    }

    fn on_alarm_cancelled(&mut self, e: &AlarmCancelledEvent) {
        let _ = writeln!(
            self.writer,
            "[alarm:cancel] token={} handle={}",
            e.token, e.handle.0,
        );
    }

    fn on_alarm_fired(&mut self, e: &AlarmFiredEvent) {
        let status = if e.stale { "STALE" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[alarm:fire] token={} at={} {status}",
            e.token,
            Time(e.at),
        );
    }
}
