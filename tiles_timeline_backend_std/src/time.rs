// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock reads.

use rustix::time::{ClockId, Timespec, clock_gettime};
use tiles_timeline_core::backend::Clock;
use tiles_timeline_core::time::EpochMillis;

const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// A [`Clock`] backed by `CLOCK_REALTIME`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        now()
    }
}

/// Returns the current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now() -> EpochMillis {
    timespec_to_epoch_millis(clock_gettime(ClockId::Realtime))
}

fn timespec_to_epoch_millis(timespec: Timespec) -> EpochMillis {
    let seconds = i64::from(timespec.tv_sec);
    let nanos = i64::from(timespec.tv_nsec).clamp(0, 999_999_999);
    EpochMillis(
        seconds
            .saturating_mul(MILLIS_PER_SECOND)
            .saturating_add(nanos / NANOS_PER_MILLI),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timespec_conversion_truncates_to_millis() {
        let millis = timespec_to_epoch_millis(Timespec {
            tv_sec: 1_700_000_000,
            tv_nsec: 123_999_999,
        });
        assert_eq!(millis, EpochMillis(1_700_000_000_123));
    }

    #[test]
    fn timespec_conversion_clamps_invalid_nanos() {
        let millis = timespec_to_epoch_millis(Timespec {
            tv_sec: 1,
            tv_nsec: 5_000_000_000,
        });
        assert_eq!(millis, EpochMillis(1_999));
    }

    #[test]
    fn timespec_conversion_saturates() {
        let millis = timespec_to_epoch_millis(Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 0,
        });
        assert!(millis.is_never());
    }

    #[test]
    fn system_clock_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > EpochMillis(1_577_836_800_000));
    }
}
