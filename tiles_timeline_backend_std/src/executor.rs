// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred listener delivery.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tiles_timeline_core::backend::{Executor, Task};

#[derive(Default)]
struct TaskQueue {
    tasks: VecDeque<Task>,
    capacity: usize,
    dropped_count: u64,
}

impl TaskQueue {
    fn push(&mut self, task: Task) {
        if self.tasks.len() == self.capacity {
            drop(self.tasks.pop_front());
            self.dropped_count += 1;
        }
        self.tasks.push_back(task);
    }
}

/// Bounded FIFO [`Executor`] drained by the host event loop.
///
/// Once full, new tasks push out the oldest queued one. Each dispatch
/// supersedes the previous one, so losing a stale notification under
/// backlog is harmless; [`dropped_count`](Self::dropped_count) reports how
/// often it happened.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct QueuedExecutor {
    inner: Rc<RefCell<TaskQueue>>,
}

impl std::fmt::Debug for QueuedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("QueuedExecutor")
            .field("len", &inner.tasks.len())
            .field("capacity", &inner.capacity)
            .field("dropped_count", &inner.dropped_count)
            .finish_non_exhaustive()
    }
}

impl QueuedExecutor {
    /// Default capacity used by [`new`](Self::new).
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a queue holding up to [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY)
    /// tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a queue holding up to `capacity` tasks. Zero is promoted to
    /// one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Rc::new(RefCell::new(TaskQueue {
                tasks: VecDeque::with_capacity(capacity),
                capacity,
                dropped_count: 0,
            })),
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().tasks.is_empty()
    }

    /// Number of tasks discarded because the queue was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.inner.borrow().dropped_count
    }

    /// Runs queued tasks in submission order until the queue is empty, and
    /// returns how many ran.
    ///
    /// Tasks submitted while draining run in the same call.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.borrow_mut().tasks.pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl Default for QueuedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for QueuedExecutor {
    fn execute(&self, task: Task) {
        self.inner.borrow_mut().push(task);
    }
}
