// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tiles_timeline_core::backend::Listener;
use tiles_timeline_core::timeline::{TimelineEntry, Validity};

/// One layout update seen by a [`RecordingListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery<T> {
    /// Token the manager passed.
    pub token: i32,
    /// Payload of the delivered entry.
    pub payload: T,
    /// Validity window of the delivered entry.
    pub validity: Option<Validity>,
}

/// A [`Listener`] that keeps a copy of every update.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to a manager.
pub struct RecordingListener<T> {
    log: Rc<RefCell<Vec<Delivery<T>>>>,
}

impl<T> Clone for RecordingListener<T> {
    fn clone(&self) -> Self {
        Self {
            log: Rc::clone(&self.log),
        }
    }
}

impl<T> Default for RecordingListener<T> {
    fn default() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T> fmt::Debug for RecordingListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingListener")
            .field("deliveries", &self.log.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<T: Clone> RecordingListener<T> {
    /// Creates a listener with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update received so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery<T>> {
        self.log.borrow().clone()
    }

    /// Payloads of every update received so far.
    #[must_use]
    pub fn payloads(&self) -> Vec<T> {
        self.log.borrow().iter().map(|d| d.payload.clone()).collect()
    }

    /// Payload of the most recent update.
    #[must_use]
    pub fn last_payload(&self) -> Option<T> {
        self.log.borrow().last().map(|d| d.payload.clone())
    }

    /// Number of updates received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Returns `true` if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Forgets everything received so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl<T: Clone> Listener<T> for RecordingListener<T> {
    fn on_layout_update(&self, token: i32, entry: &TimelineEntry<T>) {
        self.log.borrow_mut().push(Delivery {
            token,
            payload: entry.payload().clone(),
            validity: entry.validity(),
        });
    }
}
