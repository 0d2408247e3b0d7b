// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only lookup index over a [`Timeline`].
//!
//! [`TimelineCache`] answers three questions about a fixed timeline:
//!
//! - which entry is active at a given time
//!   ([`find_timeline_entry_for_time`](TimelineCache::find_timeline_entry_for_time)),
//! - which entry is nearest when none is active
//!   ([`find_closest_timeline_entry`](TimelineCache::find_closest_timeline_entry)),
//! - when the current choice goes stale
//!   ([`find_current_timeline_entry_expiry`](TimelineCache::find_current_timeline_entry_expiry)).
//!
//! # Selection rules
//!
//! An entry is *active* at `t` when its validity window contains `t`; entries
//! without a window are always active. Among active entries the one with the
//! shortest window wins, so a broad default entry can be overridden by
//! narrower ones without splicing the timeline. Entries of equal length
//! resolve to the one that comes first in the timeline.
//!
//! When nothing is active, the closest entry is the one whose window edge is
//! nearest to `t` (`start - t` for future windows, `t - end` for past ones),
//! again resolving ties by timeline order.
//!
//! # Index layout
//!
//! ```text
//!   entries:     [A: 0..1000] [B: 400..500] [C: always]
//!   by_length:   B (100)  →  A (1000)  →  C (∞)
//!   boundaries:  0, 400, 500, 1000
//! ```
//!
//! Exact lookup walks `by_length` and stops at the first window containing
//! `t`. Expiry search steps through `boundaries` (plus the hand-over point
//! between a past and a future window while in a gap).

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::time::{EpochMillis, Millis};
use crate::timeline::{Timeline, TimelineEntry, TimelineEntryId};

/// How a [`Selection`] was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionKind {
    /// The entry's window contains the query time.
    Exact,
    /// Nothing contained the query time; the entry is the nearest one.
    Closest,
}

/// The entry chosen for a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Selection {
    /// The chosen entry.
    pub id: TimelineEntryId,
    /// Whether the entry is active or a fallback.
    pub kind: SelectionKind,
}

/// Lookup index built once from a [`Timeline`].
///
/// Entries are stored behind [`Arc`] so that a selected entry can be handed
/// to a listener on another executor without cloning the payload.
#[derive(Clone, Debug)]
pub struct TimelineCache<T> {
    entries: Vec<Arc<TimelineEntry<T>>>,
    /// Entry indices ordered by window length, then timeline order.
    by_length: Vec<usize>,
    /// Every window start and end, sorted and deduplicated.
    boundaries: Vec<EpochMillis>,
}

impl<T> TimelineCache<T> {
    /// Builds the index for `timeline`.
    #[must_use]
    pub fn new(timeline: Timeline<T>) -> Self {
        let entries: Vec<Arc<TimelineEntry<T>>> =
            timeline.into_entries().into_iter().map(Arc::new).collect();

        let mut by_length: Vec<usize> = (0..entries.len()).collect();
        // Entries without a window rank after every window, including ones
        // whose length saturates to `Millis::INFINITE`. Stable sort keeps
        // timeline order among equal lengths.
        by_length.sort_by_key(|&i| (entries[i].validity().is_none(), entries[i].duration()));

        let mut boundaries: Vec<EpochMillis> = entries
            .iter()
            .filter_map(|e| e.validity())
            .flat_map(|v| [v.start(), v.end()])
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        Self {
            entries,
            by_length,
            boundaries,
        }
    }

    /// Number of entries in the underlying timeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the underlying timeline is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an entry handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this cache.
    #[must_use]
    pub fn entry(&self, id: TimelineEntryId) -> &TimelineEntry<T> {
        &self.entries[id.0]
    }

    pub(crate) fn shared_entry(&self, id: TimelineEntryId) -> Arc<TimelineEntry<T>> {
        Arc::clone(&self.entries[id.0])
    }

    /// Iterates over entries in timeline order with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (TimelineEntryId, &TimelineEntry<T>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (TimelineEntryId(i), &**e))
    }

    /// Returns the entry active at `now`, or `None` if no window contains it.
    ///
    /// The shortest containing window wins; equal lengths resolve to the
    /// earliest entry in timeline order.
    #[must_use]
    pub fn find_timeline_entry_for_time(&self, now: EpochMillis) -> Option<TimelineEntryId> {
        self.by_length
            .iter()
            .copied()
            .find(|&i| self.entries[i].is_valid_at(now))
            .map(TimelineEntryId)
    }

    /// Returns the entry whose window edge is nearest to `now`, or `None` if
    /// the timeline is empty.
    ///
    /// Meant as a fallback when
    /// [`find_timeline_entry_for_time`](Self::find_timeline_entry_for_time)
    /// finds nothing. Ties resolve to the earliest entry in timeline order.
    #[must_use]
    pub fn find_closest_timeline_entry(&self, now: EpochMillis) -> Option<TimelineEntryId> {
        let mut best: Option<(usize, Millis)> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let distance = entry.distance_to(now);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| TimelineEntryId(i))
    }

    /// Exact lookup with the closest entry as fallback.
    #[must_use]
    pub fn select(&self, now: EpochMillis) -> Option<Selection> {
        if let Some(id) = self.find_timeline_entry_for_time(now) {
            return Some(Selection {
                id,
                kind: SelectionKind::Exact,
            });
        }
        self.find_closest_timeline_entry(now).map(|id| Selection {
            id,
            kind: SelectionKind::Closest,
        })
    }

    /// Returns the time after `now` at which `id` stops being the entry to
    /// show, or [`EpochMillis::MAX`] if it is never superseded.
    ///
    /// If `id` is active at `now`, this is the first later time at which
    /// [`find_timeline_entry_for_time`](Self::find_timeline_entry_for_time)
    /// no longer returns it: its own end, or the start of a shorter window
    /// that begins first.
    ///
    /// If `id` is only a fallback at `now`, this is the first later time at
    /// which [`select`](Self::select) picks something else: a window
    /// opening, or the hand-over point where a future window becomes nearer
    /// than a past one.
    ///
    /// The result is always strictly after `now`.
    #[must_use]
    pub fn find_current_timeline_entry_expiry(
        &self,
        id: TimelineEntryId,
        now: EpochMillis,
    ) -> EpochMillis {
        if self.find_timeline_entry_for_time(now) == Some(id) {
            self.active_expiry(id, now)
        } else {
            self.fallback_expiry(id, now)
        }
    }

    fn active_expiry(&self, id: TimelineEntryId, now: EpochMillis) -> EpochMillis {
        let own_end = self.entries[id.0]
            .validity()
            .map_or(EpochMillis::MAX, |v| v.end());

        // Only entries ranked ahead of `id` can displace it. None of them
        // contains `now`, so the ones that matter start later.
        self.by_length
            .iter()
            .copied()
            .take_while(|&i| i != id.0)
            .filter_map(|i| self.entries[i].validity())
            .filter(|v| v.start() > now && v.start() < v.end())
            .map(|v| v.start())
            .fold(own_end, EpochMillis::min)
    }

    fn fallback_expiry(&self, id: TimelineEntryId, now: EpochMillis) -> EpochMillis {
        let mut t = now;
        while let Some(next) = self.next_change_candidate(t) {
            if self.select(next).map(|s| s.id) != Some(id) {
                return next;
            }
            t = next;
        }
        EpochMillis::MAX
    }

    /// Earliest time after `t` at which [`select`](Self::select) may change.
    fn next_change_candidate(&self, t: EpochMillis) -> Option<EpochMillis> {
        let idx = self.boundaries.partition_point(|&b| b <= t);
        let boundary = self.boundaries.get(idx).copied();
        match (boundary, self.handover_after(t)) {
            (Some(b), Some(h)) => Some(b.min(h)),
            (b, h) => b.or(h),
        }
    }

    /// While `t` falls in a gap, the point where the nearest future window
    /// overtakes the nearest past one.
    ///
    /// Distances are equal at the midpoint, where timeline order decides, so
    /// the hand-over is either the midpoint or the millisecond after it.
    fn handover_after(&self, t: EpochMillis) -> Option<EpochMillis> {
        if self.find_timeline_entry_for_time(t).is_some() {
            return None;
        }
        let windows = || self.entries.iter().filter_map(|e| e.validity());
        let last_end = windows().map(|v| v.end()).filter(|&e| e <= t).max()?;
        let next_start = windows().map(|v| v.start()).filter(|&s| s > t).min()?;

        let mid = last_end.midpoint_floor(next_start);
        [mid, EpochMillis(mid.0.saturating_add(1))]
            .into_iter()
            .find(|&c| c > t)
    }
}
