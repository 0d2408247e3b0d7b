// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Absolute wall-clock time and millisecond spans.
//!
//! [`EpochMillis`] is a point in time expressed as milliseconds since the Unix
//! epoch. Timeline validity windows, clock reads and alarm deadlines all use
//! it, so no conversion happens inside the core.
//!
//! [`EpochMillis::MAX`] doubles as the "never" sentinel: an entry whose
//! expiry is `MAX` is never superseded, and the manager never arms an alarm
//! for it.
//!
//! [`Millis`] is a span in the same units. Arithmetic between the two
//! saturates at the `i64` bounds so that the sentinel survives clamping.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time in milliseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    /// The earliest representable instant.
    pub const MIN: Self = Self(i64::MIN);

    /// The latest representable instant, used as "never".
    pub const MAX: Self = Self(i64::MAX);

    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Returns `true` if this is the [`MAX`](Self::MAX) "never" sentinel.
    #[inline]
    #[must_use]
    pub const fn is_never(self) -> bool {
        self.0 == i64::MAX
    }

    /// Adds a span, saturating at the representable bounds.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, span: Millis) -> Self {
        Self(self.0.saturating_add(span.0))
    }

    /// Subtracts a span, saturating at the representable bounds.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, span: Millis) -> Self {
        Self(self.0.saturating_sub(span.0))
    }

    /// Returns the span from `earlier` to `self`, saturating at the `i64`
    /// bounds. Negative if `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Millis {
        Millis(self.0.saturating_sub(earlier.0))
    }

    /// Returns the midpoint between `self` and `later`, rounded towards
    /// `self`.
    ///
    /// Computed without overflow for any pair of instants.
    #[inline]
    #[must_use]
    pub const fn midpoint_floor(self, later: Self) -> Self {
        // Averaging via the halves avoids overflow near the bounds.
        let half = (self.0 >> 1) + (later.0 >> 1) + (self.0 & later.0 & 1);
        Self(half)
    }
}

impl Add<Millis> for EpochMillis {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Millis) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub<Millis> for EpochMillis {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Millis) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Sub for EpochMillis {
    type Output = Millis;

    #[inline]
    fn sub(self, rhs: Self) -> Millis {
        self.saturating_since(rhs)
    }
}

impl fmt::Debug for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_never() {
            f.write_str("EpochMillis(never)")
        } else {
            write!(f, "EpochMillis({})", self.0)
        }
    }
}

/// A span of time in milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millis(pub i64);

impl Millis {
    /// A zero-length span.
    pub const ZERO: Self = Self(0);

    /// The longest representable span. Entries without a validity window
    /// report this as their duration.
    pub const INFINITE: Self = Self(i64::MAX);

    /// One second.
    pub const SECOND: Self = Self(1_000);

    /// One minute.
    pub const MINUTE: Self = Self(60_000);

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Creates a span from whole seconds, saturating on overflow.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000))
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Add for Millis {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl fmt::Debug for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Millis({})", self.0)
    }
}
