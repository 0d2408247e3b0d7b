// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use tiles_timeline_core::backend::Clock;
use tiles_timeline_core::time::{EpochMillis, Millis};

/// A clock that only moves when told to.
///
/// Clones share the same reading.
#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<EpochMillis>>,
}

impl fmt::Debug for FakeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FakeClock").field(&self.now.get()).finish()
    }
}

impl FakeClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: EpochMillis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Sets the reading. Moving backwards is allowed.
    pub fn set(&self, now: EpochMillis) {
        self.now.set(now);
    }

    /// Moves the reading forward by `span`.
    pub fn advance(&self, span: Millis) {
        self.now.set(self.now.get().saturating_add(span));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> EpochMillis {
        self.now.get()
    }
}
