// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timeline data model.
//!
//! A [`Timeline`] is an ordered list of [`TimelineEntry`] values. Each entry
//! pairs an opaque layout payload with an optional [`Validity`] window
//! `[start, end)`. Entries without a window are valid for all time and act as
//! the default layout; narrower windows override it while they are active.
//!
//! Overlapping windows are expected. The order of entries only matters when
//! two candidates are otherwise indistinguishable, in which case the earlier
//! one wins. See [`TimelineCache`](crate::cache::TimelineCache) for the
//! selection rules.

use alloc::vec::Vec;
use core::fmt;

use crate::time::{EpochMillis, Millis};

/// Errors from building timeline data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineError {
    /// A validity window ends before it starts.
    InvertedValidity {
        /// Requested start of the window.
        start: EpochMillis,
        /// Requested end of the window.
        end: EpochMillis,
    },
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedValidity { start, end } => write!(
                f,
                "validity window ends at {} before it starts at {}",
                end.millis(),
                start.millis()
            ),
        }
    }
}

impl core::error::Error for TimelineError {}

/// A half-open validity window `[start, end)` in epoch milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Validity {
    start: EpochMillis,
    end: EpochMillis,
}

impl Validity {
    /// Creates a window from `start` (inclusive) to `end` (exclusive).
    ///
    /// # Panics
    ///
    /// Panics if `end` is before `start`. Use [`try_new`](Self::try_new) for
    /// windows that come from untrusted input.
    #[inline]
    #[must_use]
    pub const fn new(start: EpochMillis, end: EpochMillis) -> Self {
        assert!(start.0 <= end.0, "validity window must not end before it starts");
        Self { start, end }
    }

    /// Creates a window, rejecting one that ends before it starts.
    ///
    /// An empty window (`start == end`) is accepted; it never contains any
    /// time.
    pub const fn try_new(start: EpochMillis, end: EpochMillis) -> Result<Self, TimelineError> {
        if start.0 <= end.0 {
            Ok(Self { start, end })
        } else {
            Err(TimelineError::InvertedValidity { start, end })
        }
    }

    /// Inclusive start of the window.
    #[inline]
    #[must_use]
    pub const fn start(self) -> EpochMillis {
        self.start
    }

    /// Exclusive end of the window.
    #[inline]
    #[must_use]
    pub const fn end(self) -> EpochMillis {
        self.end
    }

    /// Length of the window.
    #[inline]
    #[must_use]
    pub const fn duration(self) -> Millis {
        self.end.saturating_since(self.start)
    }

    /// Returns `true` if `t` lies within `[start, end)`.
    #[inline]
    #[must_use]
    pub const fn contains(self, t: EpochMillis) -> bool {
        self.start.0 <= t.0 && t.0 < self.end.0
    }

    /// Distance from `t` to the nearest edge of the window, or zero if the
    /// window contains `t`.
    ///
    /// For a window that lies in the future this is `start - t`; for one in
    /// the past it is `t - end`.
    #[must_use]
    pub const fn distance_to(self, t: EpochMillis) -> Millis {
        if t.0 < self.start.0 {
            self.start.saturating_since(t)
        } else if t.0 >= self.end.0 {
            t.saturating_since(self.end)
        } else {
            Millis::ZERO
        }
    }
}

impl fmt::Debug for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validity[{}, {})", self.start.0, self.end.0)
    }
}

/// A layout payload with an optional validity window.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimelineEntry<T> {
    payload: T,
    validity: Option<Validity>,
}

impl<T> TimelineEntry<T> {
    /// Creates an entry that is valid for all time.
    #[must_use]
    pub const fn always(payload: T) -> Self {
        Self {
            payload,
            validity: None,
        }
    }

    /// Creates an entry that is valid within `validity`.
    #[must_use]
    pub const fn new(payload: T, validity: Validity) -> Self {
        Self {
            payload,
            validity: Some(validity),
        }
    }

    /// Creates an entry valid within `[start, end)`, rejecting inverted
    /// windows.
    pub fn with_window(payload: T, start: EpochMillis, end: EpochMillis) -> Result<Self, TimelineError> {
        Ok(Self::new(payload, Validity::try_new(start, end)?))
    }

    /// The layout payload.
    #[inline]
    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    /// Consumes the entry and returns its payload.
    #[inline]
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// The validity window, or `None` if the entry is always valid.
    #[inline]
    #[must_use]
    pub const fn validity(&self) -> Option<Validity> {
        self.validity
    }

    /// Length of the validity window; [`Millis::INFINITE`] without one.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> Millis {
        match self.validity {
            Some(v) => v.duration(),
            None => Millis::INFINITE,
        }
    }

    /// Returns `true` if the entry is valid at `t`.
    #[inline]
    #[must_use]
    pub const fn is_valid_at(&self, t: EpochMillis) -> bool {
        match self.validity {
            Some(v) => v.contains(t),
            None => true,
        }
    }

    /// Distance from `t` to the nearest edge of the validity window.
    ///
    /// Always zero for entries without a window.
    #[inline]
    #[must_use]
    pub const fn distance_to(&self, t: EpochMillis) -> Millis {
        match self.validity {
            Some(v) => v.distance_to(t),
            None => Millis::ZERO,
        }
    }
}

/// Index of an entry within its [`Timeline`].
///
/// Handles are produced by [`TimelineCache`](crate::cache::TimelineCache)
/// lookups and resolved with
/// [`TimelineCache::entry`](crate::cache::TimelineCache::entry).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimelineEntryId(pub(crate) usize);

impl TimelineEntryId {
    /// Rebuilds a handle from a position, e.g. when decoding a recorded
    /// trace.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the entry in timeline order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for TimelineEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimelineEntryId({})", self.0)
    }
}

/// An ordered collection of timeline entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline<T> {
    entries: Vec<TimelineEntry<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Timeline<T> {
    /// Creates an empty timeline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates a timeline holding a single always-valid entry.
    #[must_use]
    pub fn single(payload: T) -> Self {
        let mut timeline = Self::new();
        timeline.push(TimelineEntry::always(payload));
        timeline
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: TimelineEntry<T>) {
        self.entries.push(entry);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the timeline has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in timeline order.
    pub fn iter(&self) -> core::slice::Iter<'_, TimelineEntry<T>> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> Vec<TimelineEntry<T>> {
        self.entries
    }
}

impl<T> FromIterator<TimelineEntry<T>> for Timeline<T> {
    fn from_iter<I: IntoIterator<Item = TimelineEntry<T>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<TimelineEntry<T>> for Timeline<T> {
    fn extend<I: IntoIterator<Item = TimelineEntry<T>>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a Timeline<T> {
    type Item = &'a TimelineEntry<T>;
    type IntoIter = core::slice::Iter<'a, TimelineEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn validity_is_half_open() {
        let v = Validity::new(EpochMillis(0), EpochMillis(100));
        assert!(v.contains(EpochMillis(0)));
        assert!(v.contains(EpochMillis(99)));
        assert!(!v.contains(EpochMillis(100)));
        assert!(!v.contains(EpochMillis(-1)));
        assert_eq!(v.duration(), Millis(100));
    }

    #[test]
    fn empty_window_contains_nothing() {
        let v = Validity::new(EpochMillis(50), EpochMillis(50));
        assert!(!v.contains(EpochMillis(50)));
        assert_eq!(v.duration(), Millis::ZERO);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = Validity::try_new(EpochMillis(10), EpochMillis(5)).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvertedValidity {
                start: EpochMillis(10),
                end: EpochMillis(5),
            }
        );
        assert_eq!(
            err.to_string(),
            "validity window ends at 5 before it starts at 10"
        );
        assert!(TimelineEntry::with_window((), EpochMillis(10), EpochMillis(5)).is_err());
    }

    #[test]
    fn distance_to_nearest_edge() {
        let v = Validity::new(EpochMillis(100), EpochMillis(200));
        assert_eq!(v.distance_to(EpochMillis(40)), Millis(60));
        assert_eq!(v.distance_to(EpochMillis(150)), Millis::ZERO);
        assert_eq!(v.distance_to(EpochMillis(200)), Millis::ZERO);
        assert_eq!(v.distance_to(EpochMillis(260)), Millis(60));
    }

    #[test]
    fn always_valid_entry() {
        let entry = TimelineEntry::always("default");
        assert!(entry.is_valid_at(EpochMillis::MIN));
        assert!(entry.is_valid_at(EpochMillis(1_700_000_000_000)));
        assert_eq!(entry.duration(), Millis::INFINITE);
        assert_eq!(entry.distance_to(EpochMillis(12)), Millis::ZERO);
        assert_eq!(entry.validity(), None);
    }

    #[test]
    fn single_entry_timeline() {
        let timeline = Timeline::single(7_u8);
        assert_eq!(timeline.len(), 1);
        let entry = timeline.iter().next().unwrap();
        assert_eq!(*entry.payload(), 7);
        assert!(entry.validity().is_none());
    }

    #[test]
    fn collect_preserves_order() {
        let timeline: Timeline<u8> = (0..3)
            .map(|i| TimelineEntry::new(i, Validity::new(EpochMillis(0), EpochMillis(10))))
            .collect();
        let payloads: alloc::vec::Vec<u8> = timeline.iter().map(|e| *e.payload()).collect();
        assert_eq!(payloads, [0, 1, 2]);
        assert!(!timeline.is_empty());
        assert!(Timeline::<u8>::new().is_empty());
    }
}
